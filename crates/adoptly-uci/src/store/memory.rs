// ── In-memory store ──
//
// Used by tests and dry runs. Can be frozen read-only to exercise the
// package-creation failure path.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::ConfigStore;
use crate::error::Error;
use crate::format;
use crate::package::Package;

#[derive(Debug, Default)]
pub struct MemoryStore {
    packages: Mutex<BTreeMap<String, Package>>,
    read_only: bool,
    commits: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every create and commit.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Seed a package from UCI text.
    pub fn with_package(self, name: &str, contents: &str) -> Result<Self, Error> {
        let pkg = format::parse(name, contents)?;
        self.lock_packages().insert(name.to_owned(), pkg);
        Ok(self)
    }

    /// Current stored copy of a package, if any.
    pub fn snapshot(&self, name: &str) -> Option<Package> {
        self.lock_packages().get(name).cloned()
    }

    /// Names of committed packages, in commit order.
    pub fn commit_log(&self) -> Vec<String> {
        self.commits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn lock_packages(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Package>> {
        self.packages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ConfigStore for MemoryStore {
    fn list_packages(&self) -> Result<BTreeSet<String>, Error> {
        Ok(self.lock_packages().keys().cloned().collect())
    }

    fn load(&self, package: &str) -> Result<Package, Error> {
        self.lock_packages()
            .get(package)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound {
                package: package.to_owned(),
            })
    }

    fn create_empty(&self, package: &str) -> Result<(), Error> {
        if self.read_only {
            return Err(Error::ReadOnly {
                package: package.to_owned(),
            });
        }
        self.lock_packages()
            .entry(package.to_owned())
            .or_insert_with(|| Package::new(package));
        Ok(())
    }

    fn commit(&self, package: &Package) -> Result<(), Error> {
        if self.read_only {
            return Err(Error::ReadOnly {
                package: package.name().to_owned(),
            });
        }
        self.lock_packages()
            .insert(package.name().to_owned(), package.clone());
        self.commits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(package.name().to_owned());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn staged_changes_are_invisible_until_commit() {
        let store = MemoryStore::new()
            .with_package("wireless", "config wifi-device 'radio0'\n")
            .unwrap();

        let mut staged = store.load("wireless").unwrap();
        staged.new_section("wifi-iface", "guest").unwrap();
        assert_eq!(store.snapshot("wireless").unwrap().len(), 1);

        store.commit(&staged).unwrap();
        assert_eq!(store.snapshot("wireless").unwrap().len(), 2);
        assert_eq!(store.commit_log(), ["wireless"]);
    }

    #[test]
    fn read_only_store_refuses_creation() {
        let store = MemoryStore::read_only();
        let err = store.create_empty("hotspot").unwrap_err();
        assert!(err.is_permission_denied());
        assert!(!store.contains("hotspot").unwrap());
    }
}
