// ── wireless backend ──
//
// Rebuilds every `wifi-iface` section of the `wireless` package from the
// payload: one section per (WLAN, requested band). Radio devices and any
// other section types are left alone.

use tracing::debug;

use super::{Backend, PackagePolicy};
use crate::context::ParseContext;
use crate::error::CoreError;
use crate::schema::{Band, Wlan};

const PACKAGE: &str = "wireless";
const IFACE_TYPE: &str = "wifi-iface";

#[derive(Debug, Clone, Copy, Default)]
pub struct Wireless;

impl Backend for Wireless {
    fn name(&self) -> &'static str {
        "wireless"
    }

    fn package(&self) -> &'static str {
        PACKAGE
    }

    fn init(&self, ctx: &mut ParseContext<'_>) -> Result<(), CoreError> {
        ctx.open_package(PACKAGE, PackagePolicy::MustExist, |pkg| {
            pkg.delete_sections_of_type(IFACE_TYPE)
        })
    }

    fn process(&self, ctx: &mut ParseContext<'_>) -> Result<(), CoreError> {
        let mut ifaces = Vec::new();
        for group in ctx.payload().wlan_groups()? {
            for wlan in group.wlans()? {
                ifaces.extend(IfacePlan::from_wlan(&wlan)?);
            }
        }

        // ifname numbering restarts at wlan0 on every run.
        for (ifindex, iface) in ifaces.iter().enumerate() {
            iface.stage(ctx, ifindex)?;
        }
        debug!(interfaces = ifaces.len(), "wifi-iface sections staged");
        Ok(())
    }
}

// ── Interface plan ───────────────────────────────────────────────────

/// Everything needed to write one `wifi-iface` section.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IfacePlan {
    section: String,
    band: Band,
    ssid: String,
    disabled: bool,
    encryption: String,
    key: String,
}

impl IfacePlan {
    fn from_wlan(wlan: &Wlan<'_>) -> Result<Vec<Self>, CoreError> {
        let ssid = wlan.ssid_name()?;
        let key = wlan.passphrase()?;
        let disabled = !wlan.is_enabled()?;
        let encryption = wlan_encryption(wlan)?;

        let bands = wlan.bands()?;
        if bands.is_empty() {
            debug!(wlan = wlan.path(), "no supported band requested, skipping");
            return Ok(Vec::new());
        }

        Ok(bands
            .into_iter()
            .map(|band| Self {
                section: format!("{}{}", sanitize(ssid), band.suffix()),
                band,
                ssid: format!("{ssid}{}", band.suffix()),
                disabled,
                encryption: encryption.clone(),
                key: key.to_owned(),
            })
            .collect())
    }

    fn stage(&self, ctx: &mut ParseContext<'_>, ifindex: usize) -> Result<(), CoreError> {
        ctx.new_section(IFACE_TYPE, &self.section)?;
        let ifname = format!("wlan{ifindex}");
        let options = [
            ("device", self.band.device()),
            ("ifname", ifname.as_str()),
            ("network", "lan"),
            ("mode", "ap"),
            ("ssid", self.ssid.as_str()),
            ("disabled", if self.disabled { "1" } else { "0" }),
            ("encryption", self.encryption.as_str()),
            ("key", self.key.as_str()),
        ];
        for (option, value) in options {
            ctx.set_option(&self.section, option, value)?;
        }
        Ok(())
    }
}

/// Section names only allow `[A-Za-z0-9_]`; everything else becomes `_`.
fn sanitize(ssid: &str) -> String {
    ssid.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// `encryption` value for a WLAN. Without a security label, a WLAN with a
/// passphrase is WPA2-PSK and one without is open.
pub fn wlan_encryption(wlan: &Wlan<'_>) -> Result<String, CoreError> {
    Ok(match wlan.security()? {
        Some(label) => encryption_for(label),
        None if wlan.passphrase()?.is_empty() => "none".to_owned(),
        None => "psk2".to_owned(),
    })
}

/// Map a security label to an `encryption` value. Unknown labels are
/// passed through verbatim.
pub fn encryption_for(security: &str) -> String {
    let normalized: String = security
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '/'))
        .collect::<String>()
        .to_ascii_lowercase();

    let mapped = match normalized.as_str() {
        "open" | "none" => "none",
        "wpapsk" | "wpapersonal" => "psk",
        "wpa2psk" | "wpa2personal" | "wpa2" => "psk2",
        "wpa3" | "sae" | "wpa3sae" | "wpa3personal" => "sae",
        "wpa2wpa3" | "wpa2wpa3personal" | "wpa2pskwpa3sae" | "saemixed" => "sae-mixed",
        _ => return security.to_owned(),
    };
    mapped.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize("Guest"), "Guest");
        assert_eq!(sanitize("Café Wi-Fi"), "Caf__Wi_Fi");
        assert_eq!(sanitize("a_b"), "a_b");
    }

    #[test]
    fn encryption_labels() {
        for (label, expected) in [
            ("Open", "none"),
            ("WPA-PSK", "psk"),
            ("WPA2-PSK", "psk2"),
            ("WPA2 Personal", "psk2"),
            ("WPA3", "sae"),
            ("WPA2/WPA3", "sae-mixed"),
            ("psk2+ccmp", "psk2+ccmp"),
        ] {
            assert_eq!(encryption_for(label), expected, "label {label:?}");
        }
    }
}
