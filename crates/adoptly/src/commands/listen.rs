//! Listen handler: apply every payload published on the device topic.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::{GlobalOpts, ListenArgs};
use crate::config::Config;
use crate::error::CliError;
use crate::iface;
use crate::output;
use crate::transport::{self, ListenSummary, ListenerOptions};

use super::util;

fn detail(s: &ListenSummary) -> String {
    format!(
        "Received:   {}\nApplied:    {}\nFailed:     {}\nReconnects: {}",
        s.received, s.applied, s.failed, s.reconnects
    )
}

/// Broker flags override the loaded config.
fn apply_overrides(cfg: &mut Config, args: &ListenArgs) {
    if let Some(ref host) = args.host {
        cfg.broker.host.clone_from(host);
    }
    if let Some(port) = args.port {
        cfg.broker.port = port;
    }
    if let Some(ref username) = args.username {
        cfg.broker.username.clone_from(username);
    }
    if let Some(ref password) = args.password {
        cfg.broker.password.clone_from(password);
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ListenArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = cfg.clone();
    apply_overrides(&mut cfg, &args);
    cfg.validate()?;

    let sysfs_root = args.iface.sysfs_root.as_ref().unwrap_or(&cfg.store.sysfs_root);
    let mac = iface::read_mac(sysfs_root, &args.iface.iface)?;
    let topic = iface::device_topic(&cfg.broker.topic_prefix, &mac);
    let opts = ListenerOptions::from_config(&cfg, topic);

    let cancel = CancellationToken::new();
    transport::cancel_on_signal(cancel.clone());
    let driver = util::build_driver(&cfg, false, cancel.clone())?;

    let color = output::should_color(&global.color);
    output::print_status(
        &format!("listening on {} at {}", opts.topic, opts.broker()),
        true,
        color,
        global.quiet,
    );

    let handler = Arc::new(move |payload: &[u8]| match driver.run_payload(payload) {
        Ok(report) => {
            for outcome in &report.outcomes {
                match outcome.error {
                    Some(ref error) => tracing::warn!(backend = %outcome.backend, %error, "backend failed"),
                    None => tracing::info!(
                        backend = %outcome.backend,
                        status = %outcome.status,
                        options = outcome.changes.options_set,
                        "backend applied"
                    ),
                }
            }
            report.is_success()
        }
        Err(error) => {
            tracing::error!(%error, "payload rejected");
            false
        }
    });

    let summary = transport::listen(&opts, &cancel, handler).await?;
    tracing::info!(?summary, "listener stopped");

    let out = output::render_single(&global.output, &summary, detail, |s| s.applied.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}
