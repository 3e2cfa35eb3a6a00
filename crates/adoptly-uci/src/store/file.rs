// ── Directory-backed store ──
//
// One UCI text file per package, `/etc/config` by default. Commits write
// a sibling temp file and rename it over the original, so a crash never
// leaves a half-written package behind.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::ConfigStore;
use crate::error::Error;
use crate::format;
use crate::package::{Package, is_valid_type};

/// Default location of UCI packages on OpenWrt.
pub const DEFAULT_CONFIG_DIR: &str = "/etc/config";

/// Packages created by [`ConfigStore::create_empty`] are owner read/write.
#[cfg(unix)]
const NEW_PACKAGE_MODE: u32 = 0o600;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, package: &str) -> Result<PathBuf, Error> {
        if !is_valid_type(package) {
            return Err(Error::InvalidName {
                kind: "package",
                name: package.to_owned(),
            });
        }
        Ok(self.dir.join(package))
    }
}

impl ConfigStore for FileStore {
    fn list_packages(&self) -> Result<BTreeSet<String>, Error> {
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.dir, e))?;
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            // Temp files and editor leftovers never match the name grammar.
            if let Some(name) = entry.file_name().to_str() {
                if is_file && is_valid_type(name) {
                    names.insert(name.to_owned());
                }
            }
        }
        Ok(names)
    }

    fn load(&self, package: &str) -> Result<Package, Error> {
        let path = self.path_for(package)?;
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::PackageNotFound {
                    package: package.to_owned(),
                });
            }
            Err(e) => return Err(Error::io(&path, e)),
        };
        let pkg = format::parse(package, &contents)?;
        debug!(package, sections = pkg.len(), path = %path.display(), "loaded package");
        Ok(pkg)
    }

    fn create_empty(&self, package: &str) -> Result<(), Error> {
        let path = self.path_for(package)?;
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(NEW_PACKAGE_MODE);
        }

        match options.open(&path) {
            Ok(_) => {
                info!(package, path = %path.display(), "created empty package");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    fn commit(&self, package: &Package) -> Result<(), Error> {
        let path = self.path_for(package.name())?;
        let tmp = self.dir.join(format!(".{}.adoptly-tmp", package.name()));
        let rendered = format::render(package);

        let write_tmp = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(rendered.as_bytes())?;
            file.sync_all()?;
            if let Ok(meta) = fs::metadata(&path) {
                fs::set_permissions(&tmp, meta.permissions())?;
            }
            Ok(())
        };

        if let Err(e) = write_tmp() {
            let _ = fs::remove_file(&tmp);
            return Err(Error::io(&tmp, e));
        }
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::io(&path, e)
        })?;

        info!(
            package = package.name(),
            sections = package.len(),
            path = %path.display(),
            "committed package"
        );
        Ok(())
    }
}
