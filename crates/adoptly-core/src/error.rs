// ── Core error types ──
//
// Every failure the reconciliation engine can report. Store-level errors
// from `adoptly-uci` are folded into the lifecycle vocabulary here so the
// CLI only has to reason about one enum.

use thiserror::Error;

use crate::accessor::Kind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Payload errors ───────────────────────────────────────────────
    #[error("schema mismatch at '{path}': expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: Kind,
        found: String,
    },

    #[error("payload is not valid JSON: {message}")]
    InvalidPayload { message: String },

    // ── Package lifecycle errors ─────────────────────────────────────
    #[error("configuration package '{package}' does not exist")]
    MissingPackage { package: String },

    #[error("cannot create configuration package '{package}': {reason}")]
    ResourceCreation { package: String, reason: String },

    #[error("section '{package}.{section}' already exists")]
    DuplicateSection { package: String, section: String },

    // ── Registry errors ──────────────────────────────────────────────
    #[error("backends '{first}' and '{second}' both target package '{package}'")]
    ConflictingBackends {
        package: String,
        first: String,
        second: String,
    },

    // ── Run control ──────────────────────────────────────────────────
    #[error("run interrupted during backend '{backend}'")]
    Interrupted { backend: String },

    #[error("backend '{backend}' lifecycle violation: {message}")]
    Lifecycle { backend: String, message: String },

    // ── Store errors (wrapped) ───────────────────────────────────────
    #[error("configuration store error: {0}")]
    Store(adoptly_uci::Error),
}

impl CoreError {
    pub(crate) fn mismatch(path: &str, expected: Kind, found: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.to_owned(),
            expected,
            found: found.into(),
        }
    }
}

// ── Conversion from store errors ─────────────────────────────────────

impl From<adoptly_uci::Error> for CoreError {
    fn from(err: adoptly_uci::Error) -> Self {
        match err {
            adoptly_uci::Error::PackageNotFound { package } => Self::MissingPackage { package },
            adoptly_uci::Error::DuplicateSection { package, section } => {
                Self::DuplicateSection { package, section }
            }
            other => Self::Store(other),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload {
            message: err.to_string(),
        }
    }
}
