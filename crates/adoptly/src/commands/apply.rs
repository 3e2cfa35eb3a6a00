//! Apply handler: one payload file, one reconciliation run.

use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use adoptly_core::{BackendOutcome, OutcomeStatus, RunReport};

use crate::cli::{ApplyArgs, GlobalOpts, OutputFormat};
use crate::config::Config;
use crate::error::CliError;
use crate::output;
use crate::transport;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Backend")]
    backend: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: usize,
    #[tabled(rename = "Deleted")]
    deleted: usize,
    #[tabled(rename = "Options")]
    options: usize,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&BackendOutcome> for OutcomeRow {
    fn from(o: &BackendOutcome) -> Self {
        Self {
            backend: o.backend.clone(),
            package: o.package.clone(),
            status: o.status.to_string(),
            created: o.changes.sections_created,
            deleted: o.changes.sections_deleted,
            options: o.changes.options_set,
            error: o.error.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ApplyArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let payload = util::read_payload(&args.file)?;
    let cancel = CancellationToken::new();
    transport::cancel_on_signal(cancel.clone());

    let driver = util::build_driver(cfg, args.dry_run, cancel)?;
    tracing::info!(file = %args.file.display(), bytes = payload.len(), dry_run = args.dry_run, "applying payload");

    let report = tokio::task::spawn_blocking(move || driver.run_payload(&payload))
        .await
        .map_err(|e| CliError::Io(std::io::Error::other(e)))??;

    print_report(&report, global);

    let total = report.outcomes.len();
    let failed = report.failures().count();
    if failed > 0 {
        return Err(CliError::PartialFailure { failed, total });
    }

    let verb = if args.dry_run { "staged" } else { "committed" };
    output::print_status(
        &format!("{verb} {total} package(s)"),
        true,
        output::should_color(&global.color),
        global.quiet,
    );
    Ok(())
}

fn print_report(report: &RunReport, global: &GlobalOpts) {
    let out = output::render_list(
        &global.output,
        &report.outcomes,
        |o| OutcomeRow::from(o),
        |o| format!("{} {}", o.package, o.status),
    );
    output::print_output(&out, global.quiet);

    // Dry runs print each staged package after the table.
    if matches!(global.output, OutputFormat::Table) {
        for outcome in &report.outcomes {
            if let (OutcomeStatus::DryRun, Some(text)) = (outcome.status, &outcome.rendered) {
                output::print_output(&format!("\n# {}\n{}", outcome.package, text.trim_end()), global.quiet);
            }
        }
    }
}
