//! Kind Registry
//!
//! Maps kind names to the handlers that decode their proposed entries.
//! A registry is an ordinary value: build one at start-up, register the
//! kinds the process supports and hand out references to it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entry::ProposedEntry;
use crate::error::{RegistryError, Result};
use crate::kind::{EntryImpl, KindHandler};
use crate::kinds;

/// Table of kind handlers keyed by kind name
#[derive(Default)]
pub struct KindRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn KindHandler>>>,
}

impl KindRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every kind shipped with this crate
    pub fn with_builtin_kinds() -> Result<Self> {
        let registry = Self::new();
        kinds::register_builtin(&registry)?;
        Ok(registry)
    }

    // Inserts are single map operations; a poisoned lock still guards a whole map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn KindHandler>>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn KindHandler>>> {
        self.handlers.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a handler under its own kind name
    ///
    /// A later registration for the same kind replaces the earlier one.
    pub fn register(&self, handler: impl KindHandler + 'static) {
        self.register_shared(Arc::new(handler));
    }

    /// Register an already shared handler
    pub fn register_shared(&self, handler: Arc<dyn KindHandler>) {
        let kind = handler.kind().to_string();
        if self.write().insert(kind.clone(), handler).is_some() {
            tracing::warn!(kind = %kind, "replaced existing kind handler");
        } else {
            tracing::debug!(kind = %kind, "registered kind");
        }
    }

    /// Look up the handler for a kind
    pub fn lookup(&self, kind: &str) -> Option<Arc<dyn KindHandler>> {
        self.read().get(kind).cloned()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.read().contains_key(kind)
    }

    /// Registered kind names, sorted
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<_> = self.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Decode a proposed entry into its versioned implementation
    ///
    /// The handler is cloned out of the table before decoding, so decoding
    /// never holds the registry lock.
    pub fn unmarshal(&self, entry: &ProposedEntry) -> Result<Box<dyn EntryImpl>> {
        let handler = self
            .lookup(&entry.kind)
            .ok_or_else(|| RegistryError::KindNotFound {
                kind: entry.kind.clone(),
            })?;
        handler.unmarshal_entry(entry)
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
