// ── Captive-portal settings ──
//
// The option set shared by the `hotspot` and `chilli` backends. Every
// value is read before anything is staged, so a payload missing any of
// them leaves the snapshot untouched.

use serde::Serialize;

use crate::context::ParseContext;
use crate::error::CoreError;
use crate::schema::Payload;

/// Portal values taken from group 0 / WLAN 0 of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortalSettings {
    pub radius: String,
    pub radius_secret: String,
    pub radius_port: String,
    pub radius2: String,
    pub homepage: String,
}

impl PortalSettings {
    pub fn from_payload(payload: &Payload<'_>) -> Result<Self, CoreError> {
        let wlan = payload.first_wlan()?;
        let primary = wlan.radius(0)?.server(0)?;
        let secondary = wlan.radius(1)?.server(0)?;
        let guest = wlan.guest_access(0)?;

        Ok(Self {
            radius: primary.ip()?.to_owned(),
            radius_secret: primary.secret()?.to_owned(),
            radius_port: primary.port()?.to_owned(),
            radius2: secondary.ip()?.to_owned(),
            homepage: guest.portal_url()?.to_owned(),
        })
    }

    /// `(option, value)` pairs in write order.
    pub fn options(&self) -> [(&'static str, &str); 6] {
        [
            ("HS_RADIUS", self.radius.as_str()),
            ("HS_RADSECRET", self.radius_secret.as_str()),
            ("HS_UAMALLOW", self.radius.as_str()),
            ("HS_PORT", self.radius_port.as_str()),
            ("HS_RADIUS2", self.radius2.as_str()),
            ("HS_UAMHOMEPAGE", self.homepage.as_str()),
        ]
    }

    pub(crate) fn stage(&self, ctx: &mut ParseContext<'_>, section: &str) -> Result<(), CoreError> {
        for (option, value) in self.options() {
            ctx.set_option(section, option, value)?;
        }
        Ok(())
    }
}
