//! Reconciliation engine for adoptly.
//!
//! Maps a hotspot provisioning document (WLAN groups, WLANs, RADIUS
//! servers, guest portals) onto UCI configuration packages. Each
//! [`Backend`] owns one package; the [`Driver`] runs the backends of a
//! [`Registry`] in order and commits every package it processed cleanly.
//!
//! ```text
//! payload ──▶ accessor/schema ──▶ Backend::process ──▶ staged Package ──▶ commit
//! ```

pub mod accessor;
pub mod backend;
pub mod context;
pub mod driver;
pub mod error;
pub mod registry;
pub mod schema;

pub use accessor::{Kind, Node};
pub use backend::{Backend, Chilli, Hotspot, PackagePolicy, PortalSettings, Wireless};
pub use context::{LifecycleState, ParseContext, StagedChanges};
pub use driver::{BackendOutcome, Driver, FailurePolicy, OutcomeStatus, RunReport};
pub use error::CoreError;
pub use registry::{HotspotFamily, Registry};
pub use schema::{Band, Payload, Wlan, WlanGroup};
