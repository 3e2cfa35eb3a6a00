// ── Payload schema ──
//
// Typed views over the provisioning document. Each view wraps an accessor
// `Node`, so every lookup keeps fail-fast semantics and full error paths.
// Views are cheap to construct and only borrow the parsed payload.

use serde_json::Value;

use crate::accessor::{Kind, Node};
use crate::error::CoreError;

// ── Field names ──────────────────────────────────────────────────────

const WLAN_GROUP_LIST: &str = "WlanGroupList";
const WLANS: &str = "wlans";
const GROUP_NAME: &str = "name";
const WLAN_NAME: &str = "wlanName";
const SSID_NAME: &[&str] = &["ssidName", "ssid_name"];
const SECURITY: &str = "security";
const PASSPHRASE: &str = "passphrase";
const STATUS: &str = "status";
const RADIOS: &str = "radios";
const RADIUS_SERVER_LIST: &str = "RadiusServerList";
const ATTEMPTS: &[&str] = &["attempts", "attemps"];
const SERVERS: &str = "servers";
const GUEST_ACCESS_LIST: &str = "GuestAccessList";
const PORTAL_URL: &str = "portalUrl";

// ── Band ─────────────────────────────────────────────────────────────

/// Radio band a WLAN can be served on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Band {
    #[strum(to_string = "2.4 GHz")]
    Ghz2_4,
    #[strum(to_string = "5 GHz")]
    Ghz5,
}

impl Band {
    /// Fixed creation order: 2.4 GHz before 5 GHz.
    pub const ALL: [Self; 2] = [Self::Ghz2_4, Self::Ghz5];

    /// Radio device serving this band.
    pub fn device(self) -> &'static str {
        match self {
            Self::Ghz2_4 => "radio0",
            Self::Ghz5 => "radio1",
        }
    }

    /// Suffix appended to the SSID and section name.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Ghz2_4 => "2_5GHz",
            Self::Ghz5 => "5GHz",
        }
    }

    /// Bands named in a `radios` string, in creation order. Matching is by
    /// substring, so `"2.4 GHz, 5 GHz"` requests both.
    pub fn requested(radios: &str) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|band| radios.contains(&band.to_string()))
            .collect()
    }
}

// ── Payload ──────────────────────────────────────────────────────────

/// The whole provisioning document.
#[derive(Debug, Clone)]
pub struct Payload<'a> {
    root: Node<'a>,
}

impl<'a> Payload<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            root: Node::root(value),
        }
    }

    pub fn wlan_groups(&self) -> Result<Vec<WlanGroup<'a>>, CoreError> {
        let list = self.root.field(WLAN_GROUP_LIST, Kind::Array)?;
        Ok(list
            .elements(Kind::Object)?
            .into_iter()
            .map(|node| WlanGroup { node })
            .collect())
    }

    /// Group 0, WLAN 0: the WLAN the hotspot backends configure.
    pub fn first_wlan(&self) -> Result<Wlan<'a>, CoreError> {
        let group = self
            .root
            .field(WLAN_GROUP_LIST, Kind::Array)?
            .index(0, Kind::Object)?;
        WlanGroup { node: group }.wlan(0)
    }
}

// ── WLAN groups ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WlanGroup<'a> {
    node: Node<'a>,
}

impl<'a> WlanGroup<'a> {
    pub fn path(&self) -> &str {
        self.node.path()
    }

    /// Optional display name of the group.
    pub fn name(&self) -> Result<Option<&'a str>, CoreError> {
        self.node
            .optional(GROUP_NAME, Kind::String)?
            .map(|n| n.as_str())
            .transpose()
    }

    pub fn wlans(&self) -> Result<Vec<Wlan<'a>>, CoreError> {
        Ok(self
            .node
            .field(WLANS, Kind::Array)?
            .elements(Kind::Object)?
            .into_iter()
            .map(|node| Wlan { node })
            .collect())
    }

    pub fn wlan(&self, index: usize) -> Result<Wlan<'a>, CoreError> {
        let node = self
            .node
            .field(WLANS, Kind::Array)?
            .index(index, Kind::Object)?;
        Ok(Wlan { node })
    }
}

// ── WLAN ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Wlan<'a> {
    node: Node<'a>,
}

impl<'a> Wlan<'a> {
    pub fn path(&self) -> &str {
        self.node.path()
    }

    pub fn ssid_name(&self) -> Result<&'a str, CoreError> {
        self.node.field_any(SSID_NAME, Kind::String)?.as_str()
    }

    /// Operator-facing WLAN label, when present.
    pub fn wlan_name(&self) -> Result<Option<&'a str>, CoreError> {
        self.node
            .optional(WLAN_NAME, Kind::String)?
            .map(|n| n.as_str())
            .transpose()
    }

    /// Security mode label, when the WLAN declares one.
    pub fn security(&self) -> Result<Option<&'a str>, CoreError> {
        self.node
            .optional(SECURITY, Kind::String)?
            .map(|n| n.as_str())
            .transpose()
    }

    pub fn passphrase(&self) -> Result<&'a str, CoreError> {
        self.node.str_field(PASSPHRASE)
    }

    pub fn status(&self) -> Result<&'a str, CoreError> {
        self.node.str_field(STATUS)
    }

    pub fn radios(&self) -> Result<&'a str, CoreError> {
        self.node.str_field(RADIOS)
    }

    /// Whether the WLAN should be up. Any status other than `enabled`
    /// (case-insensitive) disables it.
    pub fn is_enabled(&self) -> Result<bool, CoreError> {
        Ok(self.status()?.eq_ignore_ascii_case("enabled"))
    }

    pub fn bands(&self) -> Result<Vec<Band>, CoreError> {
        Ok(Band::requested(self.radios()?))
    }

    /// RADIUS entry `index`: 0 is the primary, 1 the secondary.
    pub fn radius(&self, index: usize) -> Result<RadiusEntry<'a>, CoreError> {
        let node = self
            .node
            .field(RADIUS_SERVER_LIST, Kind::Array)?
            .index(index, Kind::Object)?;
        Ok(RadiusEntry { node })
    }

    /// Every RADIUS entry, or none when the list is absent.
    pub fn radius_entries(&self) -> Result<Vec<RadiusEntry<'a>>, CoreError> {
        let Some(list) = self.node.optional(RADIUS_SERVER_LIST, Kind::Array)? else {
            return Ok(Vec::new());
        };
        Ok(list
            .elements(Kind::Object)?
            .into_iter()
            .map(|node| RadiusEntry { node })
            .collect())
    }

    pub fn guest_access(&self, index: usize) -> Result<GuestAccess<'a>, CoreError> {
        let node = self
            .node
            .field(GUEST_ACCESS_LIST, Kind::Array)?
            .index(index, Kind::Object)?;
        Ok(GuestAccess { node })
    }
}

// ── RADIUS ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RadiusEntry<'a> {
    node: Node<'a>,
}

impl<'a> RadiusEntry<'a> {
    pub fn server(&self, index: usize) -> Result<RadiusServer<'a>, CoreError> {
        let node = self
            .node
            .field(SERVERS, Kind::Array)?
            .index(index, Kind::Object)?;
        Ok(RadiusServer { node })
    }

    /// Retry count, when the entry carries one.
    pub fn attempts(&self) -> Result<Option<i64>, CoreError> {
        self.node
            .optional_any(ATTEMPTS, Kind::Integer)?
            .map(|n| n.as_i64())
            .transpose()
    }
}

#[derive(Debug, Clone)]
pub struct RadiusServer<'a> {
    node: Node<'a>,
}

impl<'a> RadiusServer<'a> {
    pub fn ip(&self) -> Result<&'a str, CoreError> {
        self.node.str_field("ip")
    }

    pub fn secret(&self) -> Result<&'a str, CoreError> {
        self.node.str_field("secret")
    }

    pub fn port(&self) -> Result<&'a str, CoreError> {
        self.node.str_field("port")
    }
}

// ── Guest access ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GuestAccess<'a> {
    node: Node<'a>,
}

impl<'a> GuestAccess<'a> {
    pub fn portal_url(&self) -> Result<&'a str, CoreError> {
        self.node.str_field(PORTAL_URL)
    }
}
