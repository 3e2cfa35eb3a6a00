//! CLI configuration: thin wrapper around `adoptly_config`.
//!
//! Re-exports the shared types and layers `GlobalOpts` flag overrides
//! (--config-dir, --hotspot-backend, --isolate) on top of the loaded file.

use adoptly_core::{FailurePolicy, HotspotFamily};

use crate::cli::{GlobalOpts, HotspotBackend};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use adoptly_config::{Config, config_path, load_config, save_config_to, to_toml};

// ── CLI-specific helpers ────────────────────────────────────────────

impl From<HotspotBackend> for HotspotFamily {
    fn from(arg: HotspotBackend) -> Self {
        match arg {
            HotspotBackend::Hotspot => Self::Hotspot,
            HotspotBackend::Chilli => Self::Chilli,
            HotspotBackend::None => Self::None,
        }
    }
}

/// Load the config file and apply global flag overrides.
///
/// Flags beat environment, environment beats the file.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config()?;
    apply_overrides(&mut cfg, global);
    tracing::debug!(
        config_dir = %cfg.store.config_dir.display(),
        hotspot_backend = %cfg.reconcile.hotspot_backend,
        failure_policy = %cfg.reconcile.failure_policy,
        "resolved configuration"
    );
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref dir) = global.config_dir {
        cfg.store.config_dir.clone_from(dir);
    }
    if let Some(backend) = global.hotspot_backend {
        cfg.reconcile.hotspot_backend = backend.into();
    }
    if global.isolate {
        cfg.reconcile.failure_policy = FailurePolicy::Isolate;
    }
}
