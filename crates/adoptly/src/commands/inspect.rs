//! Inspect handler: summarize a payload's WLANs without touching the store.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use adoptly_core::backend::wlan_encryption;
use adoptly_core::{CoreError, Payload};

use crate::cli::{GlobalOpts, InspectArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// One WLAN as the backends would see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WlanSummary {
    pub group: usize,
    pub group_name: Option<String>,
    pub wlan: usize,
    pub name: Option<String>,
    pub ssid: String,
    pub bands: Vec<String>,
    pub enabled: bool,
    pub encryption: String,
    pub radius_servers: usize,
    pub attempts: Option<i64>,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct WlanRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "WLAN")]
    wlan: String,
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "Bands")]
    bands: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Encryption")]
    encryption: String,
    #[tabled(rename = "RADIUS")]
    radius: usize,
    #[tabled(rename = "Attempts")]
    attempts: String,
}

impl From<&WlanSummary> for WlanRow {
    fn from(w: &WlanSummary) -> Self {
        let label = |name: Option<&str>, idx: usize| match name {
            Some(name) => format!("{idx} ({name})"),
            None => idx.to_string(),
        };
        Self {
            group: label(w.group_name.as_deref(), w.group),
            wlan: label(w.name.as_deref(), w.wlan),
            ssid: w.ssid.clone(),
            bands: if w.bands.is_empty() {
                "-".into()
            } else {
                w.bands.join(", ")
            },
            enabled: if w.enabled { "yes" } else { "no" }.into(),
            encryption: w.encryption.clone(),
            radius: w.radius_servers,
            attempts: w.attempts.map_or_else(|| "-".into(), |a| a.to_string()),
        }
    }
}

// ── Summary ─────────────────────────────────────────────────────────

/// Walk every WLAN group and WLAN in payload order.
pub fn summarize(value: &Value) -> Result<Vec<WlanSummary>, CoreError> {
    let payload = Payload::new(value);
    let mut summaries = Vec::new();

    for (group_idx, group) in payload.wlan_groups()?.into_iter().enumerate() {
        let group_name = group.name()?.map(str::to_owned);
        for (wlan_idx, wlan) in group.wlans()?.into_iter().enumerate() {
            let radius = wlan.radius_entries()?;
            let attempts = match radius.first() {
                Some(entry) => entry.attempts()?,
                None => None,
            };
            summaries.push(WlanSummary {
                group: group_idx,
                group_name: group_name.clone(),
                wlan: wlan_idx,
                name: wlan.wlan_name()?.map(str::to_owned),
                ssid: wlan.ssid_name()?.to_owned(),
                bands: wlan.bands()?.iter().map(ToString::to_string).collect(),
                enabled: wlan.is_enabled()?,
                encryption: wlan_encryption(&wlan)?,
                radius_servers: radius.len(),
                attempts,
            });
        }
    }
    Ok(summaries)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &InspectArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let value = util::read_json(&args.file)?;
    let summaries = summarize(&value)?;

    let out = output::render_list(
        &global.output,
        &summaries,
        |w| WlanRow::from(w),
        |w| w.ssid.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
