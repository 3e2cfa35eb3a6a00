//! Configuration-store adapter for OpenWrt-style UCI packages.
//!
//! - **[`Package`]**: in-memory snapshot of one package. Sections and
//!   options are staged on it; it is the unit of commit and rollback.
//! - **[`ConfigStore`]**: list/load/create/commit, implemented by
//!   [`FileStore`] (`/etc/config`) and [`MemoryStore`] (tests, dry runs).
//! - **[`format`]**: the UCI text syntax, parsed and rendered in
//!   `uci export` layout.
//! - **[`Selector`]**: `package.section[.option]` paths, including
//!   `@type[index]` section references.

pub mod error;
pub mod format;
pub mod package;
pub mod selector;
pub mod store;

pub use error::Error;
pub use package::{OptionValue, Package, Section};
pub use selector::{SectionRef, Selector};
pub use store::{ConfigStore, FileStore, MemoryStore};
