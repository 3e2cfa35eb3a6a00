//! Shared helpers for command handlers.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use adoptly_core::{Driver, Registry};
use adoptly_uci::FileStore;

use crate::config::Config;
use crate::error::CliError;

/// Read a payload from `path`, or from stdin when `path` is `-`.
pub fn read_payload(path: &Path) -> Result<Vec<u8>, CliError> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read(path)?)
}

/// Parse a payload file as JSON.
pub fn read_json(path: &Path) -> Result<serde_json::Value, CliError> {
    Ok(serde_json::from_slice(&read_payload(path)?)?)
}

/// Driver over the configured store, backends and failure policy.
pub fn build_driver(
    cfg: &Config,
    dry_run: bool,
    cancel: CancellationToken,
) -> Result<Driver, CliError> {
    let registry = Registry::standard(cfg.reconcile.hotspot_backend)?;
    let store = Arc::new(FileStore::new(&cfg.store.config_dir));
    tracing::debug!(backends = ?registry.names(), dir = %cfg.store.config_dir.display(), "driver ready");

    Ok(Driver::new(registry, store)
        .with_policy(cfg.reconcile.failure_policy)
        .with_dry_run(dry_run)
        .with_cancel(cancel))
}
