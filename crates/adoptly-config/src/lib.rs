//! Configuration for adoptly.
//!
//! A TOML file plus `ADOPTLY_` environment variables, layered over
//! built-in defaults with figment. Nested keys use a double underscore in
//! the environment: `ADOPTLY_BROKER__HOST=10.0.0.5`. The file location
//! comes from `ADOPTLY_CONFIG` when set, otherwise the platform config
//! directory. CLI flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use adoptly_core::{FailurePolicy, HotspotFamily};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ADOPTLY_CONFIG";

const ENV_PREFIX: &str = "ADOPTLY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// MQTT broker the listener subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BrokerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_guest")]
    pub username: String,

    /// Plaintext in the file; prefer `ADOPTLY_BROKER__PASSWORD`.
    #[serde(default = "default_guest")]
    pub password: String,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Device topics are `<prefix>/<mac>`.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_guest(),
            password: default_guest(),
            keep_alive_secs: default_keep_alive(),
            topic_prefix: default_topic_prefix(),
        }
    }
}

impl BrokerConfig {
    pub fn password(&self) -> SecretString {
        SecretString::from(self.password.clone())
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    1883
}
fn default_guest() -> String {
    "guest".into()
}
fn default_keep_alive() -> u64 {
    60
}
fn default_topic_prefix() -> String {
    "adopt/device".into()
}

/// Backoff applied when the broker connection drops.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Consecutive failed attempts before giving up. `0` retries forever.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            max_retries: default_max_retries(),
        }
    }
}

impl ReconnectConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn retry_limit(&self) -> Option<u32> {
        (self.max_retries > 0).then_some(self.max_retries)
    }
}

fn default_initial_delay() -> u64 {
    1_000
}
fn default_max_delay() -> u64 {
    30_000
}
fn default_max_retries() -> u32 {
    10
}

/// Where the UCI packages and network interfaces live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            sysfs_root: default_sysfs_root(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    "/etc/config".into()
}
fn default_sysfs_root() -> PathBuf {
    "/sys".into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub hotspot_backend: HotspotFamily,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::Validation {
            field: field.into(),
            reason: reason.into(),
        };

        if self.broker.host.trim().is_empty() {
            return Err(invalid("broker.host", "must not be empty"));
        }
        if self.broker.port == 0 {
            return Err(invalid("broker.port", "must be between 1 and 65535"));
        }
        if self.broker.topic_prefix.is_empty() || self.broker.topic_prefix.ends_with('/') {
            return Err(invalid(
                "broker.topic_prefix",
                "must be non-empty without a trailing '/'",
            ));
        }
        if self.reconnect.initial_delay_ms > self.reconnect.max_delay_ms {
            return Err(invalid(
                "reconnect.initial_delay_ms",
                "must not exceed reconnect.max_delay_ms",
            ));
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// `ADOPTLY_CONFIG` when set, else the platform config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "adoptly", "adoptly").map_or_else(
        || PathBuf::from("/etc/adoptly/config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults → TOML file (if present) → environment, then validate.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_toml(cfg)?)?;
    Ok(())
}

pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}
