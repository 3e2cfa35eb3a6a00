// ── Reconciliation driver ──
//
// Runs every registered backend against one payload, in registry order,
// and commits each package after its backend processed cleanly. Exit and
// rollback run on every path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};

use adoptly_uci::ConfigStore;

use crate::backend::Backend;
use crate::context::{LifecycleState, ParseContext, StagedChanges};
use crate::error::CoreError;
use crate::registry::Registry;

/// What happens to the remaining backends after one fails.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FailurePolicy {
    /// The first failure ends the run.
    #[default]
    Abort,
    /// Roll back the failing backend and keep going.
    Isolate,
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OutcomeStatus {
    Committed,
    DryRun,
    Failed,
}

/// Result of one backend within a run.
#[derive(Debug, Clone, Serialize)]
pub struct BackendOutcome {
    pub backend: String,
    pub package: String,
    pub status: OutcomeStatus,
    pub changes: StagedChanges,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Staged package as UCI text (dry runs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<BackendOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &BackendOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

// ── Driver ───────────────────────────────────────────────────────────

pub struct Driver {
    registry: Registry,
    store: Arc<dyn ConfigStore>,
    policy: FailurePolicy,
    dry_run: bool,
    cancel: CancellationToken,
}

impl Driver {
    pub fn new(registry: Registry, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            registry,
            store,
            policy: FailurePolicy::default(),
            dry_run: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stage and render everything, commit nothing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parse raw bytes and run them.
    pub fn run_payload(&self, payload: &[u8]) -> Result<RunReport, CoreError> {
        let value: Value = serde_json::from_slice(payload)?;
        self.run(&value)
    }

    /// Reconcile every registered backend against `payload`.
    ///
    /// Under [`FailurePolicy::Abort`] the first failure is returned as the
    /// error. Under [`FailurePolicy::Isolate`] failures are recorded in the
    /// report and the run continues. Cancellation always ends the run with
    /// [`CoreError::Interrupted`].
    pub fn run(&self, payload: &Value) -> Result<RunReport, CoreError> {
        let mut report = RunReport::default();

        for backend in self.registry.iter() {
            if self.cancel.is_cancelled() {
                return Err(CoreError::Interrupted {
                    backend: backend.name().to_owned(),
                });
            }

            let span = info_span!("backend", name = backend.name(), package = backend.package());
            let _guard = span.enter();

            match self.run_backend(backend, payload) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(err @ CoreError::Interrupted { .. }) => return Err(err),
                Err(err) if self.policy == FailurePolicy::Abort => {
                    warn!(error = %err, "backend failed, aborting run");
                    return Err(err);
                }
                Err(err) => {
                    warn!(error = %err, "backend failed, continuing");
                    report.outcomes.push(BackendOutcome {
                        backend: backend.name().to_owned(),
                        package: backend.package().to_owned(),
                        status: OutcomeStatus::Failed,
                        changes: StagedChanges::default(),
                        error: Some(err.to_string()),
                        rendered: None,
                    });
                }
            }
        }

        Ok(report)
    }

    fn run_backend(&self, backend: &dyn Backend, payload: &Value) -> Result<BackendOutcome, CoreError> {
        let mut ctx = ParseContext::new(backend.name(), payload, self.store.as_ref(), self.dry_run);

        let result = self.drive(backend, &mut ctx);
        let changes = ctx.changes();
        let rendered = if self.dry_run && result.is_ok() {
            ctx.render()
        } else {
            None
        };

        backend.exit(&mut ctx);
        ctx.release();
        ctx.advance(LifecycleState::Exited)?;

        let status = result?;
        Ok(BackendOutcome {
            backend: backend.name().to_owned(),
            package: backend.package().to_owned(),
            status,
            changes,
            error: None,
            rendered,
        })
    }

    fn drive(&self, backend: &dyn Backend, ctx: &mut ParseContext<'_>) -> Result<OutcomeStatus, CoreError> {
        backend.init(ctx)?;
        ctx.advance(LifecycleState::Initialized)?;

        backend.process(ctx)?;
        ctx.advance(LifecycleState::Processed)?;

        if self.dry_run {
            info!(changes = ?ctx.changes(), "dry run, nothing committed");
            return Ok(OutcomeStatus::DryRun);
        }
        if self.cancel.is_cancelled() {
            return Err(CoreError::Interrupted {
                backend: backend.name().to_owned(),
            });
        }

        ctx.commit()?;
        info!(changes = ?ctx.changes(), "package committed");
        Ok(OutcomeStatus::Committed)
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}
