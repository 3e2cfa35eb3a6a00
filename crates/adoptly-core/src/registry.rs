// ── Backend registry ──
//
// An explicit, ordered list of backends built once at startup. Order is
// processing and commit order. Two backends may never own the same
// package.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{Backend, Chilli, Hotspot, Wireless};
use crate::error::CoreError;

/// Which captive-portal backend a device runs.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HotspotFamily {
    /// Rebuild a dedicated `hotspot` package.
    Hotspot,
    /// Update the stock `chilli` package in place.
    #[default]
    Chilli,
    /// Only reconcile `wireless`.
    None,
}

#[derive(Default)]
pub struct Registry {
    backends: Vec<Box<dyn Backend>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `wireless` followed by the selected hotspot-family backend.
    pub fn standard(family: HotspotFamily) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        registry.register(Box::new(Wireless))?;
        match family {
            HotspotFamily::Hotspot => registry.register(Box::new(Hotspot))?,
            HotspotFamily::Chilli => registry.register(Box::new(Chilli))?,
            HotspotFamily::None => {}
        }
        Ok(registry)
    }

    /// Append a backend. Rejects a second backend for an owned package.
    pub fn register(&mut self, backend: Box<dyn Backend>) -> Result<(), CoreError> {
        if let Some(owner) = self
            .backends
            .iter()
            .find(|b| b.package() == backend.package())
        {
            return Err(CoreError::ConflictingBackends {
                package: backend.package().to_owned(),
                first: owner.name().to_owned(),
                second: backend.name().to_owned(),
            });
        }
        debug!(backend = backend.name(), package = backend.package(), "backend registered");
        self.backends.push(backend);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Backend> {
        self.backends.iter().map(|b| &**b)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(Backend::name).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
