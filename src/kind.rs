//! Kind handlers and versioned entry implementations

use std::any::Any;
use std::fmt;

use crate::entry::ProposedEntry;
use crate::error::{BoxError, RegistryError, Result};
use crate::resolver::{VersionFactory, VersionResolver};

/// A version-specific decoder/validator for one kind's payload
pub trait EntryImpl: Any + Send + Sync {
    /// Populate and validate this object from the envelope payload
    fn unmarshal(&mut self, entry: &ProposedEntry) -> std::result::Result<(), BoxError>;

    /// Schema version implemented by this object
    fn api_version(&self) -> &str;

    /// Canonical serialized form of the validated entry
    fn canonicalize(&self) -> std::result::Result<Vec<u8>, BoxError>;

    /// Whether the entry references material that has to be fetched
    fn has_external_entities(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn EntryImpl {
    /// Borrow the concrete implementation
    pub fn downcast_ref<T: EntryImpl>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: EntryImpl>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl fmt::Debug for dyn EntryImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryImpl")
            .field("api_version", &self.api_version())
            .finish_non_exhaustive()
    }
}

/// Accepts proposed entries of one kind
pub trait KindHandler: Send + Sync {
    /// Kind name this handler is registered under
    fn kind(&self) -> &str;

    /// Decode `entry` with the implementation matching its declared version
    fn unmarshal_entry(&self, entry: &ProposedEntry) -> Result<Box<dyn EntryImpl>>;

    /// Version constraints this handler accepts, in lookup order
    fn versions(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Stock handler: a kind name plus its version resolver
#[derive(Debug)]
pub struct VersionedKind {
    kind: String,
    resolver: VersionResolver,
}

impl VersionedKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            resolver: VersionResolver::new(),
        }
    }

    /// Bind a version range of this kind to an implementation factory
    pub fn register_version<F>(&self, constraint: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Option<Box<dyn EntryImpl>> + Send + Sync + 'static,
    {
        self.resolver.set(constraint, factory)
    }

    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    fn resolve(&self, version: &str) -> Result<VersionFactory> {
        self.resolver
            .get(version)
            .ok_or_else(|| RegistryError::VersionNotSupported {
                kind: self.kind.clone(),
                version: version.to_string(),
            })
    }
}

impl KindHandler for VersionedKind {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn unmarshal_entry(&self, entry: &ProposedEntry) -> Result<Box<dyn EntryImpl>> {
        if entry.kind != self.kind {
            return Err(RegistryError::PayloadTypeMismatch {
                expected: self.kind.clone(),
                actual: entry.kind.clone(),
            });
        }

        let version = entry.api_version.as_str();
        let factory = self.resolve(version)?;

        let mut object = factory().ok_or_else(|| RegistryError::FactoryFailure {
            kind: self.kind.clone(),
            version: version.to_string(),
        })?;

        object
            .unmarshal(entry)
            .map_err(|source| RegistryError::DecodeFailure {
                kind: self.kind.clone(),
                version: version.to_string(),
                source,
            })?;

        tracing::debug!(kind = %self.kind, version, "unmarshaled entry");
        Ok(object)
    }

    fn versions(&self) -> Vec<String> {
        self.resolver.constraints()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Counter {
        value: u64,
    }

    impl EntryImpl for Counter {
        fn unmarshal(&mut self, entry: &ProposedEntry) -> std::result::Result<(), BoxError> {
            self.value = entry.spec["value"].as_u64().ok_or("value must be an integer")?;
            Ok(())
        }

        fn api_version(&self) -> &str {
            "1.0.0"
        }

        fn canonicalize(&self) -> std::result::Result<Vec<u8>, BoxError> {
            Ok(serde_json::to_vec(&json!({ "value": self.value }))?)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn counter_kind() -> VersionedKind {
        let kind = VersionedKind::new("counter");
        kind.register_version(">=1.0.0 <2.0.0", || {
            Some(Box::new(Counter::default()) as Box<dyn EntryImpl>)
        })
        .unwrap();
        kind
    }

    #[test]
    fn test_unmarshal_entry() {
        let kind = counter_kind();
        let entry = ProposedEntry::new("counter", "1.2.0", json!({ "value": 7 }));

        let object = kind.unmarshal_entry(&entry).unwrap();
        assert_eq!(object.downcast_ref::<Counter>().map(|c| c.value), Some(7));
        assert_eq!(object.canonicalize().unwrap(), br#"{"value":7}"#.to_vec());
        assert!(!object.has_external_entities());
    }

    #[test]
    fn test_kind_mismatch() {
        let kind = counter_kind();
        let entry = ProposedEntry::new("rekord", "1.0.0", json!({ "value": 7 }));

        match kind.unmarshal_entry(&entry) {
            Err(RegistryError::PayloadTypeMismatch { expected, actual }) => {
                assert_eq!(expected, "counter");
                assert_eq!(actual, "rekord");
            }
            other => panic!("expected PayloadTypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_version() {
        let kind = counter_kind();
        for version in ["2.0.0", "not-a-version"] {
            let entry = ProposedEntry::new("counter", version, json!({ "value": 1 }));
            let err = kind.unmarshal_entry(&entry).unwrap_err();
            assert!(matches!(err, RegistryError::VersionNotSupported { .. }));
            assert_eq!(err.version(), Some(version));
        }
    }

    #[test]
    fn test_factory_failure() {
        let kind = VersionedKind::new("counter");
        kind.register_version("1.x", || None).unwrap();

        let entry = ProposedEntry::new("counter", "1.0.0", json!({}));
        let err = kind.unmarshal_entry(&entry).unwrap_err();
        assert!(matches!(err, RegistryError::FactoryFailure { ref version, .. } if version == "1.0.0"));
    }

    #[test]
    fn test_decode_failure_propagates() {
        let kind = counter_kind();
        let entry = ProposedEntry::new("counter", "1.0.0", json!({ "value": "seven" }));

        match kind.unmarshal_entry(&entry) {
            Err(RegistryError::DecodeFailure { source, .. }) => {
                assert_eq!(source.to_string(), "value must be an integer");
            }
            other => panic!("expected DecodeFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_versions_listed() {
        assert_eq!(counter_kind().versions(), vec![">=1.0.0 <2.0.0"]);
    }
}
