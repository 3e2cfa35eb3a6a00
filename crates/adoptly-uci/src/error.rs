use thiserror::Error;

/// Top-level error type for the `adoptly-uci` crate.
///
/// Covers snapshot mutations, selector parsing, the UCI text format, and
/// the persistence layer. `adoptly-core` maps these into lifecycle errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Packages ────────────────────────────────────────────────────
    /// No package with this name exists in the store.
    #[error("configuration package '{package}' not found")]
    PackageNotFound { package: String },

    /// The store refuses writes (read-only directory or test store).
    #[error("configuration store is read-only, cannot write '{package}'")]
    ReadOnly { package: String },

    // ── Sections ────────────────────────────────────────────────────
    /// A section with this name is already staged in the package.
    #[error("section '{package}.{section}' already exists")]
    DuplicateSection { package: String, section: String },

    /// The addressed section is not present in the package snapshot.
    #[error("section '{package}.{section}' not found")]
    SectionNotFound { package: String, section: String },

    /// Package, section, type or option name outside `[A-Za-z0-9_]`.
    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },

    // ── Syntax ──────────────────────────────────────────────────────
    /// Selector string does not follow `package.section[.option]`.
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Malformed UCI text.
    #[error("parse error in '{package}' line {line}: {message}")]
    Parse {
        package: String,
        line: usize,
        message: String,
    },

    // ── IO ──────────────────────────────────────────────────────────
    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this is a "package not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PackageNotFound { .. })
    }

    /// Returns `true` if the failure comes from filesystem permissions.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::ReadOnly { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
