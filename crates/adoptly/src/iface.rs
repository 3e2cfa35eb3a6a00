//! Device identity: MAC address lookup and the adoption topic.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::CliError;

/// A 48-bit hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Twelve lowercase hex digits, no separators.
    pub fn compact(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = CliError;

    /// Accepts `aa:bb:cc:dd:ee:ff`, `aa-bb-...` and bare `aabbccddeeff`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CliError::InvalidMac {
            value: s.to_owned(),
        };
        let hex: String = s.trim().chars().filter(|c| !matches!(c, ':' | '-')).collect();
        if hex.len() != 12 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

/// `<sysfs_root>/class/net/<iface>/address`
pub fn address_path(sysfs_root: &Path, iface: &str) -> PathBuf {
    sysfs_root.join("class").join("net").join(iface).join("address")
}

/// Read the MAC address of `iface` from sysfs.
pub fn read_mac(sysfs_root: &Path, iface: &str) -> Result<MacAddress, CliError> {
    if iface.is_empty() || iface.contains('/') || iface == "." || iface == ".." {
        return Err(CliError::Validation {
            field: "iface".into(),
            reason: format!("'{iface}' is not an interface name"),
        });
    }

    let path = address_path(sysfs_root, iface);
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CliError::InterfaceNotFound {
                iface: iface.to_owned(),
                path: path.display().to_string(),
            }
        } else {
            CliError::Io(e)
        }
    })?;
    let mac = contents.parse()?;
    tracing::debug!(iface, %mac, "read interface address");
    Ok(mac)
}

/// Topic a device subscribes to for its adoption payloads.
pub fn device_topic(prefix: &str, mac: &MacAddress) -> String {
    format!("{prefix}/{}", mac.compact())
}
