// ── Backends ──
//
// One backend per configuration package. The driver runs each backend
// through init → process → exit on its own `ParseContext`; commit is the
// driver's call, never the backend's.

mod chilli;
mod hotspot;
mod portal;
mod wireless;

use crate::context::ParseContext;
use crate::error::CoreError;

pub use chilli::Chilli;
pub use hotspot::Hotspot;
pub use portal::PortalSettings;
pub use wireless::{Wireless, encryption_for, wlan_encryption};

/// What to do when a backend's package is absent from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagePolicy {
    /// Absence is fatal (`MissingPackage`).
    MustExist,
    /// Create an empty package, retrying detection a bounded number of times.
    CreateIfMissing,
}

/// A reconciliation unit for one configuration package.
pub trait Backend: Send + Sync {
    /// Stable identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Package this backend owns.
    fn package(&self) -> &'static str;

    /// Detect or create the package and stage its reset.
    fn init(&self, ctx: &mut ParseContext<'_>) -> Result<(), CoreError>;

    /// Walk the payload and stage writes.
    fn process(&self, ctx: &mut ParseContext<'_>) -> Result<(), CoreError>;

    /// Cleanup. Runs on every path, after commit or failure.
    fn exit(&self, ctx: &mut ParseContext<'_>) {
        ctx.release();
    }
}
