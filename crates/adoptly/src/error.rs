//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, store and config failures into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use adoptly_config::ConfigError;
use adoptly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const SCHEMA: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const TRANSPORT: i32 = 7;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Payload ──────────────────────────────────────────────────────
    #[error("Payload does not match the expected shape at '{path}'")]
    #[diagnostic(
        code(adoptly::schema_mismatch),
        help("Expected {expected}, found {found}.\nTry: adoptly inspect <payload>")
    )]
    SchemaMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Payload is not valid JSON")]
    #[diagnostic(code(adoptly::invalid_payload), help("{message}"))]
    InvalidPayload { message: String },

    // ── Configuration store ──────────────────────────────────────────
    #[error("Configuration package '{package}' does not exist")]
    #[diagnostic(
        code(adoptly::missing_package),
        help(
            "This package ships with the firmware and is never created.\n\
             Check --config-dir, or install the package that provides it."
        )
    )]
    MissingPackage { package: String },

    #[error("Could not create configuration package '{package}'")]
    #[diagnostic(
        code(adoptly::resource_creation),
        help("{reason}\nCheck that the config directory exists and is writable.")
    )]
    ResourceCreation { package: String, reason: String },

    #[error("Permission denied writing the configuration store")]
    #[diagnostic(
        code(adoptly::permission_denied),
        help("{message}\nRun as root, or point --config-dir at a writable directory.")
    )]
    PermissionDenied { message: String },

    #[error("Section '{package}.{section}' is defined twice by the payload")]
    #[diagnostic(
        code(adoptly::duplicate_section),
        help("Two WLANs map to the same section name. Make their SSIDs distinct.")
    )]
    DuplicateSection { package: String, section: String },

    #[error("Backends '{first}' and '{second}' both target package '{package}'")]
    #[diagnostic(code(adoptly::conflicting_backends))]
    ConflictingBackends {
        package: String,
        first: String,
        second: String,
    },

    #[error("'{selector}' not found")]
    #[diagnostic(
        code(adoptly::not_found),
        help("Run: adoptly show {package} to see its sections")
    )]
    SelectorNotFound { selector: String, package: String },

    #[error(transparent)]
    #[diagnostic(code(adoptly::store))]
    Store(adoptly_uci::Error),

    // ── Run control ──────────────────────────────────────────────────
    #[error("Run interrupted during backend '{backend}'")]
    #[diagnostic(
        code(adoptly::interrupted),
        help("Uncommitted packages were rolled back. Packages committed earlier in the run stay applied.")
    )]
    Interrupted { backend: String },

    #[error("{failed} of {total} backends failed")]
    #[diagnostic(
        code(adoptly::partial_failure),
        help("The remaining packages were committed. Rerun with -v for details.")
    )]
    PartialFailure { failed: usize, total: usize },

    #[error("Internal lifecycle error in backend '{backend}': {message}")]
    #[diagnostic(code(adoptly::lifecycle))]
    Lifecycle { backend: String, message: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Lost connection to broker at {broker}")]
    #[diagnostic(
        code(adoptly::transport),
        help(
            "{reason}\n\
             Check the broker address and credentials, or raise reconnect.max_retries."
        )
    )]
    TransportFailed { broker: String, reason: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Network interface '{iface}' not found")]
    #[diagnostic(
        code(adoptly::interface_not_found),
        help("No MAC address at {path}.\nList interfaces with: ls /sys/class/net")
    )]
    InterfaceNotFound { iface: String, path: String },

    #[error("Invalid MAC address '{value}'")]
    #[diagnostic(code(adoptly::invalid_mac))]
    InvalidMac { value: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(adoptly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(adoptly::config),
        help("Inspect the resolved values with: adoptly config show")
    )]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SchemaMismatch { .. } | Self::InvalidPayload { .. } => exit_code::SCHEMA,
            Self::MissingPackage { .. } | Self::SelectorNotFound { .. } => exit_code::NOT_FOUND,
            Self::ResourceCreation { .. } | Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::DuplicateSection { .. } | Self::ConflictingBackends { .. } => exit_code::CONFLICT,
            Self::TransportFailed { .. } => exit_code::TRANSPORT,
            Self::Interrupted { .. } => exit_code::INTERRUPTED,
            Self::InterfaceNotFound { .. }
            | Self::InvalidMac { .. }
            | Self::Validation { .. }
            | Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SchemaMismatch {
                path,
                expected,
                found,
            } => Self::SchemaMismatch {
                path,
                expected: expected.to_string(),
                found,
            },
            CoreError::InvalidPayload { message } => Self::InvalidPayload { message },
            CoreError::MissingPackage { package } => Self::MissingPackage { package },
            CoreError::ResourceCreation { package, reason } => {
                Self::ResourceCreation { package, reason }
            }
            CoreError::DuplicateSection { package, section } => {
                Self::DuplicateSection { package, section }
            }
            CoreError::ConflictingBackends {
                package,
                first,
                second,
            } => Self::ConflictingBackends {
                package,
                first,
                second,
            },
            CoreError::Interrupted { backend } => Self::Interrupted { backend },
            CoreError::Lifecycle { backend, message } => Self::Lifecycle { backend, message },
            CoreError::Store(inner) => inner.into(),
        }
    }
}

impl From<adoptly_uci::Error> for CliError {
    fn from(err: adoptly_uci::Error) -> Self {
        if err.is_permission_denied() {
            return Self::PermissionDenied {
                message: err.to_string(),
            };
        }
        match err {
            adoptly_uci::Error::PackageNotFound { package } => Self::MissingPackage { package },
            adoptly_uci::Error::DuplicateSection { package, section } => {
                Self::DuplicateSection { package, section }
            }
            adoptly_uci::Error::InvalidSelector { selector, reason } => Self::Validation {
                field: format!("selector '{selector}'"),
                reason,
            },
            other => Self::Store(other),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload {
            message: err.to_string(),
        }
    }
}
