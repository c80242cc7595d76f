//! Proposed entry envelope

use serde::{Deserialize, Serialize};

/// An untyped entry submitted to the log: a kind tag, the schema version
/// the submitter claims to follow, and the kind-specific body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedEntry {
    /// Kind tag (e.g. "rekord")
    pub kind: String,
    /// Declared schema version (e.g. "0.0.1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// Kind-specific payload, decoded by the versioned implementation
    #[serde(alias = "payload", default)]
    pub spec: serde_json::Value,
}

impl ProposedEntry {
    pub fn new(
        kind: impl Into<String>,
        api_version: impl Into<String>,
        spec: serde_json::Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            api_version: api_version.into(),
            spec,
        }
    }

    /// Parse an envelope from JSON text
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Parse an envelope from JSON bytes
    pub fn from_slice(content: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(content)
    }
}
