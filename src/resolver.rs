//! Per-kind version resolution
//!
//! Maps version range constraints to factories for the versioned entry
//! implementation that handles them. Constraints may overlap; lookups
//! return the factory of the first registered constraint containing the
//! requested version.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{RegistryError, Result};
use crate::kind::EntryImpl;
use crate::version::{parse_version, VersionRange};

/// Builds an empty entry object for one schema version range
pub type VersionFactory = Arc<dyn Fn() -> Option<Box<dyn EntryImpl>> + Send + Sync>;

struct Binding {
    range: VersionRange,
    factory: VersionFactory,
}

/// Ordered table of (range, factory) bindings for a single kind
#[derive(Default)]
pub struct VersionResolver {
    bindings: RwLock<Vec<Binding>>,
}

impl VersionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    // Writers never leave the table half-updated, so a poisoned lock is safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Binding>> {
        self.bindings.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Binding>> {
        self.bindings.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Bind `constraint` to `factory`
    ///
    /// An invalid constraint is logged and rejected, leaving the table
    /// untouched. Re-binding an identical constraint replaces its factory
    /// without moving it in the lookup order.
    pub fn set<F>(&self, constraint: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Option<Box<dyn EntryImpl>> + Send + Sync + 'static,
    {
        self.set_factory(constraint, Arc::new(factory))
    }

    /// Same as [`VersionResolver::set`] for an already shared factory
    pub fn set_factory(&self, constraint: &str, factory: VersionFactory) -> Result<()> {
        let range = VersionRange::parse(constraint).map_err(|e| {
            tracing::error!(constraint, error = %e, "rejecting version constraint");
            RegistryError::VersionConstraintInvalid {
                constraint: constraint.to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut bindings = self.write();
        match bindings.iter_mut().find(|b| b.range.as_str() == range.as_str()) {
            Some(existing) => existing.factory = factory,
            None => bindings.push(Binding { range, factory }),
        }
        tracing::debug!(constraint, "registered version constraint");
        Ok(())
    }

    /// Find the factory for a concrete version
    ///
    /// Returns `None` when the version does not parse or no constraint
    /// contains it.
    pub fn get(&self, version: &str) -> Option<VersionFactory> {
        let parsed = match parse_version(version) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(version, error = %e, "unparsable version");
                return None;
            }
        };

        self.read()
            .iter()
            .find(|b| b.range.contains(&parsed))
            .map(|b| Arc::clone(&b.factory))
    }

    /// Registered constraints in lookup order
    pub fn constraints(&self) -> Vec<String> {
        self.read().iter().map(|b| b.range.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl fmt::Debug for VersionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionResolver")
            .field("constraints", &self.constraints())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ProposedEntry;
    use crate::error::BoxError;
    use std::any::Any;

    struct Tagged(&'static str);

    impl EntryImpl for Tagged {
        fn unmarshal(&mut self, _entry: &ProposedEntry) -> std::result::Result<(), BoxError> {
            Ok(())
        }

        fn api_version(&self) -> &str {
            self.0
        }

        fn canonicalize(&self) -> std::result::Result<Vec<u8>, BoxError> {
            Ok(self.0.as_bytes().to_vec())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn tag_of(resolver: &VersionResolver, version: &str) -> Option<String> {
        let factory = resolver.get(version)?;
        factory().map(|e| e.api_version().to_string())
    }

    #[test]
    fn test_resolves_containing_range() {
        let resolver = VersionResolver::new();
        resolver
            .set(">=0.0.1 <0.0.2", || Some(Box::new(Tagged("f1")) as Box<dyn EntryImpl>))
            .unwrap();

        assert_eq!(tag_of(&resolver, "0.0.1").as_deref(), Some("f1"));
        assert!(resolver.get("0.0.2").is_none());
        assert!(resolver.get("not-a-version").is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let resolver = VersionResolver::new();
        resolver
            .set(">=1.0.0 <2.0.0", || Some(Box::new(Tagged("wide")) as Box<dyn EntryImpl>))
            .unwrap();
        resolver
            .set("1.0.0", || Some(Box::new(Tagged("exact")) as Box<dyn EntryImpl>))
            .unwrap();

        assert_eq!(tag_of(&resolver, "1.0.0").as_deref(), Some("wide"));
        assert_eq!(resolver.constraints(), vec![">=1.0.0 <2.0.0", "1.0.0"]);
    }

    #[test]
    fn test_rebinding_keeps_position() {
        let resolver = VersionResolver::new();
        resolver
            .set("1.x", || Some(Box::new(Tagged("old")) as Box<dyn EntryImpl>))
            .unwrap();
        resolver
            .set(">=1.0.0", || Some(Box::new(Tagged("other")) as Box<dyn EntryImpl>))
            .unwrap();
        resolver
            .set("1.x", || Some(Box::new(Tagged("new")) as Box<dyn EntryImpl>))
            .unwrap();

        assert_eq!(resolver.len(), 2);
        assert_eq!(tag_of(&resolver, "1.4.0").as_deref(), Some("new"));
    }

    #[test]
    fn test_invalid_constraint_is_rejected() {
        let resolver = VersionResolver::new();
        let err = resolver
            .set("definitely not semver", || None)
            .unwrap_err();

        assert!(matches!(err, RegistryError::VersionConstraintInvalid { .. }));
        assert!(resolver.is_empty());

        for constraint in ["18446744073709551615.x", "1.18446744073709551615.x"] {
            assert!(resolver.set(constraint, || None).is_err());
        }
        assert!(resolver.is_empty());
        assert!(resolver.get("1.0.0").is_none());
    }
}
