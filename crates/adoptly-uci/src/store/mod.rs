// ── Configuration store ──
//
// The persistence seam. Backends never touch files directly: they load a
// `Package` snapshot, stage mutations on it, and hand it back for commit.
// Dropping or rolling back a snapshot leaves the store untouched.

mod file;
mod memory;

use std::collections::BTreeSet;

use crate::error::Error;
use crate::package::Package;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Load/create/commit operations scoped by package name.
pub trait ConfigStore: Send + Sync {
    /// Names of every package currently present.
    fn list_packages(&self) -> Result<BTreeSet<String>, Error>;

    /// Load a snapshot of one package.
    fn load(&self, package: &str) -> Result<Package, Error>;

    /// Create an empty, persisted package if it does not exist yet.
    fn create_empty(&self, package: &str) -> Result<(), Error>;

    /// Make a staged snapshot durable, replacing the stored package.
    fn commit(&self, package: &Package) -> Result<(), Error>;

    /// Discard a staged snapshot.
    fn rollback(&self, package: Package) {
        tracing::debug!(package = package.name(), sections = package.len(), "discarding staged changes");
    }

    /// Whether a package exists.
    fn contains(&self, package: &str) -> Result<bool, Error> {
        Ok(self.list_packages()?.contains(package))
    }
}

impl<S: ConfigStore + ?Sized> ConfigStore for std::sync::Arc<S> {
    fn list_packages(&self) -> Result<BTreeSet<String>, Error> {
        (**self).list_packages()
    }

    fn load(&self, package: &str) -> Result<Package, Error> {
        (**self).load(package)
    }

    fn create_empty(&self, package: &str) -> Result<(), Error> {
        (**self).create_empty(package)
    }

    fn commit(&self, package: &Package) -> Result<(), Error> {
        (**self).commit(package)
    }

    fn rollback(&self, package: Package) {
        (**self).rollback(package);
    }
}
