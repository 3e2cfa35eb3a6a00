// ── Parse context ──
//
// Per-backend state for one payload: the borrowed payload and store, the
// staged package snapshot, lifecycle bookkeeping and change counters. A
// snapshot that was never committed is handed back to the store for
// rollback when the context is released or dropped.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use adoptly_uci::{ConfigStore, Package, format};

use crate::backend::PackagePolicy;
use crate::error::CoreError;
use crate::schema::Payload;

/// How many times package creation is retried before giving up.
pub const MAX_CREATE_ATTEMPTS: u32 = 3;

/// Lifecycle phase of a backend within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleState {
    Registered,
    Initialized,
    Processed,
    Committed,
    Exited,
}

impl LifecycleState {
    fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Registered, Self::Initialized)
                | (Self::Initialized, Self::Processed)
                | (Self::Processed, Self::Committed)
                | (Self::Registered | Self::Initialized | Self::Processed | Self::Committed, Self::Exited)
        )
    }
}

/// Counters describing what a backend staged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StagedChanges {
    pub sections_created: usize,
    pub sections_deleted: usize,
    pub options_set: usize,
}

pub struct ParseContext<'a> {
    backend: String,
    root: &'a Value,
    store: &'a dyn ConfigStore,
    dry_run: bool,
    package: Option<Package>,
    state: LifecycleState,
    changes: StagedChanges,
    committed: bool,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        backend: impl Into<String>,
        root: &'a Value,
        store: &'a dyn ConfigStore,
        dry_run: bool,
    ) -> Self {
        Self {
            backend: backend.into(),
            root,
            store,
            dry_run,
            package: None,
            state: LifecycleState::Registered,
            changes: StagedChanges::default(),
            committed: false,
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn payload(&self) -> Payload<'a> {
        Payload::new(self.root)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn changes(&self) -> StagedChanges {
        self.changes
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    // ── Package lifecycle ────────────────────────────────────────────

    /// Load (or create, per `policy`) the backend's package and run its
    /// reset on the staged snapshot.
    pub fn open_package<F>(
        &mut self,
        name: &str,
        policy: PackagePolicy,
        reset: F,
    ) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Package) -> usize,
    {
        if self.package.is_some() {
            return Err(self.lifecycle_error(format!("package '{name}' opened twice")));
        }

        let mut pkg = self.detect(name, policy)?;
        let removed = reset(&mut pkg);
        if removed > 0 {
            debug!(package = name, removed, "reset staged");
        }
        self.changes.sections_deleted += removed;
        self.package = Some(pkg);
        Ok(())
    }

    fn detect(&self, name: &str, policy: PackagePolicy) -> Result<Package, CoreError> {
        let mut attempts = 0;
        loop {
            if self.store.contains(name)? {
                return Ok(self.store.load(name)?);
            }

            let missing = || CoreError::MissingPackage {
                package: name.to_owned(),
            };
            match policy {
                PackagePolicy::MustExist => return Err(missing()),
                PackagePolicy::CreateIfMissing if self.dry_run => {
                    debug!(package = name, "dry run: staging a new package in memory");
                    return Ok(Package::new(name));
                }
                PackagePolicy::CreateIfMissing if attempts >= MAX_CREATE_ATTEMPTS => {
                    return Err(missing());
                }
                PackagePolicy::CreateIfMissing => {
                    attempts += 1;
                    debug!(package = name, attempt = attempts, "creating missing package");
                    self.store
                        .create_empty(name)
                        .map_err(|e| CoreError::ResourceCreation {
                            package: name.to_owned(),
                            reason: e.to_string(),
                        })?;
                }
            }
        }
    }

    /// The staged snapshot.
    pub fn package(&self) -> Result<&Package, CoreError> {
        self.package
            .as_ref()
            .ok_or_else(|| self.lifecycle_error("no package opened".into()))
    }

    fn package_mut(&mut self) -> Result<&mut Package, CoreError> {
        match self.package {
            Some(ref mut pkg) => Ok(pkg),
            None => Err(CoreError::Lifecycle {
                backend: self.backend.clone(),
                message: "no package opened".into(),
            }),
        }
    }

    // ── Staged writes ────────────────────────────────────────────────

    pub fn new_section(&mut self, section_type: &str, name: &str) -> Result<(), CoreError> {
        self.package_mut()?.new_section(section_type, name)?;
        self.changes.sections_created += 1;
        Ok(())
    }

    /// Returns the generated section name.
    pub fn new_anonymous_section(&mut self, section_type: &str) -> Result<String, CoreError> {
        let name = self
            .package_mut()?
            .new_anonymous_section(section_type)?
            .name()
            .to_owned();
        self.changes.sections_created += 1;
        Ok(name)
    }

    pub fn set_option(&mut self, section: &str, option: &str, value: &str) -> Result<(), CoreError> {
        self.package_mut()?.set_option(section, option, value)?;
        self.changes.options_set += 1;
        Ok(())
    }

    // ── Transitions ──────────────────────────────────────────────────

    pub fn advance(&mut self, next: LifecycleState) -> Result<(), CoreError> {
        if !self.state.can_advance_to(next) {
            return Err(self.lifecycle_error(format!(
                "illegal transition {} -> {next}",
                self.state
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Make the staged snapshot durable. Only valid after processing.
    pub fn commit(&mut self) -> Result<(), CoreError> {
        if self.state != LifecycleState::Processed {
            return Err(self.lifecycle_error(format!("commit while {}", self.state)));
        }
        self.store.commit(self.package()?)?;
        self.committed = true;
        self.advance(LifecycleState::Committed)
    }

    /// UCI text of the staged snapshot.
    pub fn render(&self) -> Option<String> {
        self.package.as_ref().map(format::render)
    }

    /// Give up the snapshot. Uncommitted changes are rolled back.
    pub fn release(&mut self) {
        let Some(pkg) = self.package.take() else {
            return;
        };
        if self.committed {
            return;
        }
        if self.state == LifecycleState::Processed && !self.dry_run {
            warn!(backend = %self.backend, package = pkg.name(), "processed changes were never committed");
        }
        self.store.rollback(pkg);
    }

    fn lifecycle_error(&self, message: String) -> CoreError {
        CoreError::Lifecycle {
            backend: self.backend.clone(),
            message,
        }
    }
}

impl Drop for ParseContext<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ParseContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseContext")
            .field("backend", &self.backend)
            .field("package", &self.package.as_ref().map(Package::name))
            .field("state", &self.state)
            .field("changes", &self.changes)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use adoptly_uci::MemoryStore;
    use serde_json::json;

    use super::*;

    #[test]
    fn must_exist_reports_missing_package() {
        let store = MemoryStore::new();
        let doc = json!({});
        let mut ctx = ParseContext::new("chilli", &doc, &store, false);
        let err = ctx
            .open_package("chilli", PackagePolicy::MustExist, |_| 0)
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingPackage { ref package } if package == "chilli"));
    }

    #[test]
    fn create_if_missing_creates_once() {
        let store = MemoryStore::new();
        let doc = json!({});
        let mut ctx = ParseContext::new("hotspot", &doc, &store, false);
        ctx.open_package("hotspot", PackagePolicy::CreateIfMissing, Package::clear)
            .unwrap();
        assert!(ctx.package().unwrap().is_empty());
        assert!(store.snapshot("hotspot").is_some());
    }

    #[test]
    fn creation_failure_is_resource_error() {
        let store = MemoryStore::read_only();
        let doc = json!({});
        let mut ctx = ParseContext::new("hotspot", &doc, &store, false);
        let err = ctx
            .open_package("hotspot", PackagePolicy::CreateIfMissing, Package::clear)
            .unwrap_err();
        assert!(matches!(err, CoreError::ResourceCreation { .. }), "{err}");
    }

    #[test]
    fn dry_run_never_creates_packages() {
        let store = MemoryStore::new();
        let doc = json!({});
        let mut ctx = ParseContext::new("hotspot", &doc, &store, true);
        ctx.open_package("hotspot", PackagePolicy::CreateIfMissing, Package::clear)
            .unwrap();
        assert!(store.snapshot("hotspot").is_none());
    }

    #[test]
    fn reset_counts_deleted_sections() {
        let store = MemoryStore::new()
            .with_package("wireless", "config wifi-iface 'a'\nconfig wifi-iface 'b'\nconfig wifi-device 'radio0'\n")
            .unwrap();
        let doc = json!({});
        let mut ctx = ParseContext::new("wireless", &doc, &store, false);
        ctx.open_package("wireless", PackagePolicy::MustExist, |pkg| {
            pkg.delete_sections_of_type("wifi-iface")
        })
        .unwrap();
        assert_eq!(ctx.changes().sections_deleted, 2);
        assert_eq!(ctx.package().unwrap().len(), 1);
    }

    #[test]
    fn commit_requires_processed_state() {
        let store = MemoryStore::new().with_package("chilli", "").unwrap();
        let doc = json!({});
        let mut ctx = ParseContext::new("chilli", &doc, &store, false);
        ctx.open_package("chilli", PackagePolicy::MustExist, |_| 0).unwrap();
        ctx.advance(LifecycleState::Initialized).unwrap();
        assert!(matches!(ctx.commit(), Err(CoreError::Lifecycle { .. })));
        assert!(ctx.advance(LifecycleState::Committed).is_err());

        ctx.advance(LifecycleState::Processed).unwrap();
        ctx.commit().unwrap();
        assert!(ctx.is_committed());
        assert_eq!(store.commit_log(), ["chilli"]);
        ctx.advance(LifecycleState::Exited).unwrap();
    }

    #[test]
    fn dropping_uncommitted_context_leaves_store_untouched() {
        let store = MemoryStore::new()
            .with_package("chilli", "config chilli\n\toption HS_RADIUS '1.1.1.1'\n")
            .unwrap();
        let before = store.snapshot("chilli").unwrap();
        {
            let doc = json!({});
            let mut ctx = ParseContext::new("chilli", &doc, &store, false);
            ctx.open_package("chilli", PackagePolicy::MustExist, Package::clear)
                .unwrap();
            ctx.new_section("chilli", "extra").unwrap();
        }
        assert_eq!(store.snapshot("chilli").unwrap(), before);
        assert!(store.commit_log().is_empty());
    }

    #[test]
    fn writes_before_open_are_lifecycle_errors() {
        let store = MemoryStore::new();
        let doc = json!({});
        let mut ctx = ParseContext::new("wireless", &doc, &store, false);
        assert!(matches!(
            ctx.set_option("x", "y", "z"),
            Err(CoreError::Lifecycle { .. })
        ));
    }
}
