//! Name → backend lookup.
//!
//! The registry is populated once at startup and then shared behind an
//! `Arc`; request handling only reads it. Names are case-sensitive.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::backend::SearchBackend;
use crate::error::{Result, SearchError};

/// A set of named, shared search backends.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn SearchBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `backend` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `name` is empty or already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        backend: Arc<dyn SearchBackend>,
    ) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SearchError::Config("backend name must not be empty".into()));
        }
        if self.backends.contains_key(&name) {
            return Err(SearchError::Config(format!("duplicate backend {name}")));
        }
        tracing::debug!(backend = %name, "registered backend");
        self.backends.insert(name, backend);
        Ok(())
    }

    /// Look up a single backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SearchBackend>> {
        self.backends.get(name).cloned()
    }

    /// Resolve every name in `names`, preserving order and duplicates.
    ///
    /// Resolution is all-or-nothing so that no backend is dispatched for a
    /// request that names an unknown one.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UnknownBackend`] for the first name that is not
    /// registered.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn SearchBackend>>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name)
                    .ok_or_else(|| SearchError::UnknownBackend(name.to_owned()))
            })
            .collect()
    }

    /// All registered names in ascending order.
    pub fn list_names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Split a comma-separated backend selection such as `"gitea,github"`.
///
/// Whitespace around each name is trimmed. Empty segments are kept as empty
/// names so that `resolve` rejects them rather than silently ignoring them.
pub fn parse_backend_list(selection: &str) -> Vec<String> {
    selection.split(',').map(|s| s.trim().to_owned()).collect()
}
