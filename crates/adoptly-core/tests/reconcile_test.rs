//! End-to-end reconciliation tests: payload in, UCI packages out.
//!
//! Each test seeds a store (a temp directory of UCI files, or an in-memory
//! store for failure injection), runs the driver, and inspects what was
//! committed.
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use adoptly_core::{
    CoreError, Driver, FailurePolicy, Hotspot, HotspotFamily, OutcomeStatus, Registry,
};
use adoptly_uci::{ConfigStore, FileStore, MemoryStore};

// ── Helpers ─────────────────────────────────────────────────────────

const WIRELESS: &str = "
config wifi-device 'radio0'
\toption type 'mac80211'

config wifi-iface 'default_radio0'
\toption device 'radio0'
\toption ssid 'OpenWrt'

config wifi-device 'radio1'
\toption type 'mac80211'
";

const CHILLI: &str = "
config chilli
\toption HS_LANIF 'br-lan'
\toption HS_RADIUS '0.0.0.0'
";

fn wlan(ssid: &str, radios: &str, status: &str) -> Value {
    json!({
        "wlanName": "guest",
        "ssidName": ssid,
        "passphrase": "secret123",
        "status": status,
        "radios": radios,
        "RadiusServerList": [
            { "attempts": 3, "servers": [{ "ip": "10.0.0.1", "secret": "radsecret", "port": "1812" }] },
            { "servers": [{ "ip": "10.0.0.2", "secret": "radsecret2", "port": "1812" }] }
        ],
        "GuestAccessList": [{ "portalUrl": "https://portal.example/welcome" }]
    })
}

fn payload(wlans: Vec<Value>) -> Value {
    json!({ "WlanGroupList": [{ "name": "default", "wlans": wlans }] })
}

/// A config directory holding `wireless` and `chilli`.
fn config_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("wireless"), WIRELESS).unwrap();
    fs::write(dir.path().join("chilli"), CHILLI).unwrap();
    dir
}

fn driver(dir: &Path, family: HotspotFamily) -> Driver {
    Driver::new(
        Registry::standard(family).unwrap(),
        Arc::new(FileStore::new(dir)),
    )
}

fn read(dir: &Path, package: &str) -> String {
    fs::read_to_string(dir.join(package)).unwrap()
}

fn option(dir: &Path, package: &str, section: &str, option: &str) -> Option<String> {
    FileStore::new(dir)
        .load(package)
        .unwrap()
        .section(section)
        .and_then(|s| s.get(option))
        .map(str::to_owned)
}

// ── Wireless mapping ────────────────────────────────────────────────

#[test]
fn dual_band_wlan_creates_one_iface_per_band() {
    let dir = config_dir();
    let report = driver(dir.path(), HotspotFamily::Chilli)
        .run(&payload(vec![wlan("Guest", "2.4 GHz and 5 GHz", "enabled")]))
        .unwrap();
    assert!(report.is_success());

    let expected = "
config wifi-device 'radio0'
\toption type 'mac80211'

config wifi-device 'radio1'
\toption type 'mac80211'

config wifi-iface 'Guest2_5GHz'
\toption device 'radio0'
\toption ifname 'wlan0'
\toption network 'lan'
\toption mode 'ap'
\toption ssid 'Guest2_5GHz'
\toption disabled '0'
\toption encryption 'psk2'
\toption key 'secret123'

config wifi-iface 'Guest5GHz'
\toption device 'radio1'
\toption ifname 'wlan1'
\toption network 'lan'
\toption mode 'ap'
\toption ssid 'Guest5GHz'
\toption disabled '0'
\toption encryption 'psk2'
\toption key 'secret123'
";
    assert_eq!(read(dir.path(), "wireless"), expected);
}

#[test]
fn disabled_status_disables_every_band() {
    let dir = config_dir();
    driver(dir.path(), HotspotFamily::Chilli)
        .run(&payload(vec![wlan("Guest", "2.4 GHz and 5 GHz", "disabled")]))
        .unwrap();

    for section in ["Guest2_5GHz", "Guest5GHz"] {
        assert_eq!(
            option(dir.path(), "wireless", section, "disabled").as_deref(),
            Some("1"),
            "{section}"
        );
    }
}

#[test]
fn ifnames_count_across_wlans_and_groups() {
    let dir = config_dir();
    let doc = json!({
        "WlanGroupList": [
            { "wlans": [wlan("Staff", "5 GHz", "enabled")] },
            { "wlans": [wlan("Guest", "2.4 GHz", "enabled"), wlan("Iot", "2.4 GHz, 5 GHz", "Enabled")] }
        ]
    });
    driver(dir.path(), HotspotFamily::None).run(&doc).unwrap();

    let ifname = |section| option(dir.path(), "wireless", section, "ifname");
    assert_eq!(ifname("Staff5GHz").as_deref(), Some("wlan0"));
    assert_eq!(ifname("Guest2_5GHz").as_deref(), Some("wlan1"));
    assert_eq!(ifname("Iot2_5GHz").as_deref(), Some("wlan2"));
    assert_eq!(ifname("Iot5GHz").as_deref(), Some("wlan3"));
}

#[test]
fn wlan_without_known_band_creates_nothing() {
    let dir = config_dir();
    driver(dir.path(), HotspotFamily::None)
        .run(&payload(vec![wlan("Guest", "6 GHz", "enabled")]))
        .unwrap();

    let pkg = FileStore::new(dir.path()).load("wireless").unwrap();
    assert_eq!(pkg.sections_of_type("wifi-iface").count(), 0);
    assert_eq!(pkg.sections_of_type("wifi-device").count(), 2);
}

#[test]
fn explicit_security_label_is_mapped() {
    let dir = config_dir();
    let mut wpa3 = wlan("Cafe", "5 GHz", "enabled");
    wpa3["security"] = json!("WPA3");
    driver(dir.path(), HotspotFamily::None)
        .run(&payload(vec![wpa3]))
        .unwrap();
    assert_eq!(
        option(dir.path(), "wireless", "Cafe5GHz", "encryption").as_deref(),
        Some("sae")
    );
}

#[test]
fn ssid_alias_is_honoured() {
    let dir = config_dir();
    let mut legacy = wlan("unused", "5 GHz", "enabled");
    let obj = legacy.as_object_mut().unwrap();
    obj.remove("ssidName");
    obj.insert("ssid_name".into(), json!("Legacy"));
    driver(dir.path(), HotspotFamily::None)
        .run(&payload(vec![legacy]))
        .unwrap();
    assert_eq!(
        option(dir.path(), "wireless", "Legacy5GHz", "ssid").as_deref(),
        Some("Legacy5GHz")
    );
}

// ── Idempotence and reset ───────────────────────────────────────────

#[test]
fn same_payload_twice_yields_identical_files() {
    let dir = config_dir();
    let doc = payload(vec![
        wlan("Guest", "2.4 GHz and 5 GHz", "enabled"),
        wlan("Staff", "5 GHz", "enabled"),
    ]);
    let driver = driver(dir.path(), HotspotFamily::Chilli);

    driver.run(&doc).unwrap();
    let first = (read(dir.path(), "wireless"), read(dir.path(), "chilli"));
    driver.run(&doc).unwrap();
    let second = (read(dir.path(), "wireless"), read(dir.path(), "chilli"));
    assert_eq!(first, second);
}

#[test]
fn bands_no_longer_requested_are_removed() {
    let dir = config_dir();
    let driver = driver(dir.path(), HotspotFamily::None);

    driver
        .run(&payload(vec![wlan("Guest", "2.4 GHz and 5 GHz", "enabled")]))
        .unwrap();
    driver
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap();

    let pkg = FileStore::new(dir.path()).load("wireless").unwrap();
    let ifaces: Vec<&str> = pkg.sections_of_type("wifi-iface").map(|s| s.name()).collect();
    assert_eq!(ifaces, ["Guest5GHz"]);
    assert!(pkg.contains_section("radio0"), "radio devices are preserved");
}

// ── Hotspot family ──────────────────────────────────────────────────

#[test]
fn missing_hotspot_package_is_created_and_filled() {
    let dir = config_dir();
    assert!(!dir.path().join("hotspot").exists());

    driver(dir.path(), HotspotFamily::Hotspot)
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap();

    let expected = "
config hotspot 'settings'
\toption HS_RADIUS '10.0.0.1'
\toption HS_RADSECRET 'radsecret'
\toption HS_UAMALLOW '10.0.0.1'
\toption HS_PORT '1812'
\toption HS_RADIUS2 '10.0.0.2'
\toption HS_UAMHOMEPAGE 'https://portal.example/welcome'
";
    assert_eq!(read(dir.path(), "hotspot"), expected);
    assert_eq!(read(dir.path(), "chilli"), CHILLI, "chilli is not touched");
}

#[test]
fn hotspot_package_is_rebuilt_from_scratch() {
    let dir = config_dir();
    fs::write(
        dir.path().join("hotspot"),
        "config hotspot 'settings'\n\toption HS_STALE '1'\nconfig other 'x'\n",
    )
    .unwrap();

    driver(dir.path(), HotspotFamily::Hotspot)
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap();

    let pkg = FileStore::new(dir.path()).load("hotspot").unwrap();
    assert_eq!(pkg.len(), 1);
    assert_eq!(pkg.option("settings", "HS_STALE"), None);
}

#[test]
fn chilli_updates_first_section_in_place() {
    let dir = config_dir();
    driver(dir.path(), HotspotFamily::Chilli)
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap();

    let expected = "
config chilli
\toption HS_LANIF 'br-lan'
\toption HS_RADIUS '10.0.0.1'
\toption HS_RADSECRET 'radsecret'
\toption HS_UAMALLOW '10.0.0.1'
\toption HS_PORT '1812'
\toption HS_RADIUS2 '10.0.0.2'
\toption HS_UAMHOMEPAGE 'https://portal.example/welcome'
";
    assert_eq!(read(dir.path(), "chilli"), expected);
}

#[test]
fn chilli_section_is_added_when_package_is_empty() {
    let dir = config_dir();
    fs::write(dir.path().join("chilli"), "").unwrap();
    driver(dir.path(), HotspotFamily::Chilli)
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap();

    let pkg = FileStore::new(dir.path()).load("chilli").unwrap();
    assert_eq!(pkg.len(), 1);
    assert!(pkg.sections()[0].is_anonymous());
    assert_eq!(pkg.sections()[0].get("HS_RADIUS2"), Some("10.0.0.2"));
}

// ── Failures leave the store unchanged ──────────────────────────────

#[test]
fn group_list_as_object_is_schema_mismatch() {
    let dir = config_dir();
    let doc = json!({ "WlanGroupList": { "wlans": [] } });

    let err = driver(dir.path(), HotspotFamily::Chilli).run(&doc).unwrap_err();
    match err {
        CoreError::SchemaMismatch {
            path,
            expected,
            found,
        } => {
            assert_eq!(path, "WlanGroupList");
            assert_eq!(expected.to_string(), "array");
            assert_eq!(found, "object");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(read(dir.path(), "wireless"), WIRELESS);
    assert_eq!(read(dir.path(), "chilli"), CHILLI);
}

#[test]
fn missing_ssid_aborts_before_any_write() {
    let dir = config_dir();
    let mut broken = wlan("Guest", "5 GHz", "enabled");
    broken.as_object_mut().unwrap().remove("ssidName");
    let doc = payload(vec![wlan("Staff", "5 GHz", "enabled"), broken]);

    let err = driver(dir.path(), HotspotFamily::Chilli).run(&doc).unwrap_err();
    assert!(
        err.to_string().contains("WlanGroupList[0].wlans[1].ssidName"),
        "{err}"
    );
    assert_eq!(read(dir.path(), "wireless"), WIRELESS);
}

#[test]
fn bandless_wlan_still_needs_its_required_fields() {
    let dir = config_dir();
    let mut broken = wlan("Guest", "6 GHz", "enabled");
    let fields = broken.as_object_mut().unwrap();
    fields.remove("ssidName");
    fields.remove("passphrase");

    let err = driver(dir.path(), HotspotFamily::None)
        .run(&payload(vec![broken]))
        .unwrap_err();
    assert!(
        matches!(
            err,
            CoreError::SchemaMismatch { ref path, .. } if path == "WlanGroupList[0].wlans[0].ssidName"
        ),
        "{err}"
    );
    assert_eq!(read(dir.path(), "wireless"), WIRELESS);
}

#[test]
fn duplicate_section_names_fail_the_backend() {
    let dir = config_dir();
    let doc = payload(vec![
        wlan("Guest", "5 GHz", "enabled"),
        wlan("Guest", "5 GHz", "disabled"),
    ]);

    let err = driver(dir.path(), HotspotFamily::None).run(&doc).unwrap_err();
    assert!(
        matches!(err, CoreError::DuplicateSection { ref section, .. } if section == "Guest5GHz"),
        "{err}"
    );
    assert_eq!(read(dir.path(), "wireless"), WIRELESS);
}

#[test]
fn abort_policy_stops_at_first_failure() {
    let store = Arc::new(
        MemoryStore::new()
            .with_package("wireless", WIRELESS)
            .unwrap()
            .with_package("chilli", CHILLI)
            .unwrap(),
    );
    let mut doc = payload(vec![wlan("Guest", "5 GHz", "enabled")]);
    doc["WlanGroupList"][0]["wlans"][0]["RadiusServerList"]
        .as_array_mut()
        .unwrap()
        .truncate(1);

    let driver = Driver::new(Registry::standard(HotspotFamily::Chilli).unwrap(), store.clone());
    let err = driver.run(&doc).unwrap_err();
    assert!(matches!(err, CoreError::SchemaMismatch { .. }), "{err}");
    // Packages commit independently, in registry order.
    assert_eq!(store.commit_log(), ["wireless"]);
}

#[test]
fn isolate_policy_continues_after_failure() {
    let store = Arc::new(MemoryStore::new().with_package("chilli", CHILLI).unwrap());
    let driver = Driver::new(Registry::standard(HotspotFamily::Chilli).unwrap(), store.clone())
        .with_policy(FailurePolicy::Isolate);

    let report = driver
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap();

    assert!(!report.is_success());
    let statuses: Vec<(&str, OutcomeStatus)> = report
        .outcomes
        .iter()
        .map(|o| (o.backend.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        [("wireless", OutcomeStatus::Failed), ("chilli", OutcomeStatus::Committed)]
    );
    let failure = report.failures().next().unwrap();
    assert!(failure.error.as_deref().unwrap().contains("wireless"));
    assert_eq!(store.commit_log(), ["chilli"]);
}

#[test]
fn unwritable_store_reports_resource_creation() {
    let store = Arc::new(MemoryStore::read_only());
    let mut registry = Registry::new();
    registry.register(Box::new(Hotspot)).unwrap();

    let err = Driver::new(registry, store.clone())
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap_err();
    assert!(
        matches!(err, CoreError::ResourceCreation { ref package, .. } if package == "hotspot"),
        "{err}"
    );
    assert!(store.list_packages().unwrap().is_empty());
}

// ── Run control ─────────────────────────────────────────────────────

#[test]
fn dry_run_renders_without_committing() {
    let dir = config_dir();
    let report = driver(dir.path(), HotspotFamily::Hotspot)
        .with_dry_run(true)
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap();

    assert!(report.outcomes.iter().all(|o| o.status == OutcomeStatus::DryRun));
    let hotspot = report.outcomes.iter().find(|o| o.package == "hotspot").unwrap();
    assert!(hotspot.rendered.as_deref().unwrap().contains("HS_RADIUS2 '10.0.0.2'"));
    assert_eq!(hotspot.changes.options_set, 6);

    assert_eq!(read(dir.path(), "wireless"), WIRELESS);
    assert!(!dir.path().join("hotspot").exists());
}

#[test]
fn cancelled_run_commits_nothing() {
    let store = Arc::new(MemoryStore::new().with_package("wireless", WIRELESS).unwrap());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = Driver::new(Registry::standard(HotspotFamily::None).unwrap(), store.clone())
        .with_cancel(cancel)
        .run(&payload(vec![wlan("Guest", "5 GHz", "enabled")]))
        .unwrap_err();
    assert!(matches!(err, CoreError::Interrupted { .. }), "{err}");
    assert!(store.commit_log().is_empty());
}

#[test]
fn non_json_payload_is_rejected() {
    let dir = config_dir();
    let err = driver(dir.path(), HotspotFamily::Chilli)
        .run_payload(b"{ not json")
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidPayload { .. }), "{err}");
}
