//! rekord v0.0.1
//!
//! ```json
//! {
//!   "signature": {
//!     "format": "pgp",
//!     "content": "<base64>",
//!     "publicKey": { "content": "<base64>" }
//!   },
//!   "data": {
//!     "content": "<base64>",
//!     "hash": { "algorithm": "sha256", "value": "<hex>" }
//!   }
//! }
//! ```
//!
//! Data is either inline (`content`) or referenced by `url`; a referenced
//! artifact must come with its hash. Signatures are not verified here.

use std::any::Any;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::KIND;
use crate::checksum::Checksum;
use crate::entry::ProposedEntry;
use crate::error::BoxError;
use crate::kind::EntryImpl;

pub const API_VERSION: &str = "0.0.1";

/// Range of declared versions handled by this implementation
pub const CONSTRAINT: &str = ">=0.0.1 <0.0.2";

#[derive(Error, Debug)]
pub enum RekordError {
    #[error("invalid rekord spec: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{field} is not valid base64: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },

    #[error("data must include either content or url")]
    MissingData,

    #[error("hash value must be provided when data is referenced by url")]
    MissingHash,

    #[error("hash value must be 64 lowercase hexadecimal characters, got '{0}'")]
    InvalidHash(String),

    #[error("data hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("entry has not been unmarshaled")]
    NotUnmarshaled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureFormat {
    Pgp,
    Minisign,
    X509,
    Ssh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublicKey {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Signature {
    pub format: SignatureFormat,
    pub content: String,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hash {
    pub algorithm: HashAlgorithm,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Data {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
}

/// The v0.0.1 payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RekordSpec {
    pub signature: Signature,
    pub data: Data,
}

fn hash_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-f]{64}$").unwrap())
}

fn decode_base64(field: &'static str, value: &str) -> Result<Vec<u8>, RekordError> {
    if value.is_empty() {
        return Err(RekordError::EmptyField(field));
    }
    STANDARD.decode(value).map_err(|e| RekordError::InvalidBase64 {
        field,
        reason: e.to_string(),
    })
}

impl RekordSpec {
    /// Check field-level constraints
    pub fn validate(&self) -> Result<(), RekordError> {
        decode_base64("signature.content", &self.signature.content)?;
        decode_base64("signature.publicKey.content", &self.signature.public_key.content)?;

        let data = &self.data;
        if let Some(hash) = &data.hash {
            if !hash_pattern().is_match(&hash.value) {
                return Err(RekordError::InvalidHash(hash.value.clone()));
            }
        }

        match (&data.content, &data.url) {
            (Some(content), _) => {
                let bytes = decode_base64("data.content", content)?;
                if let Some(hash) = &data.hash {
                    let expected = Checksum::from_hex(&hash.value);
                    if !expected.verify(&bytes) {
                        return Err(RekordError::HashMismatch {
                            expected: expected.to_string(),
                            actual: Checksum::from_bytes(&bytes).to_string(),
                        });
                    }
                }
            }
            (None, Some(url)) => {
                if url.is_empty() {
                    return Err(RekordError::EmptyField("data.url"));
                }
                if data.hash.is_none() {
                    return Err(RekordError::MissingHash);
                }
            }
            (None, None) => return Err(RekordError::MissingData),
        }

        Ok(())
    }
}

/// A decoded and validated rekord v0.0.1 entry
#[derive(Debug, Default)]
pub struct RekordEntry {
    spec: Option<RekordSpec>,
}

impl RekordEntry {
    pub fn spec(&self) -> Option<&RekordSpec> {
        self.spec.as_ref()
    }
}

impl EntryImpl for RekordEntry {
    fn unmarshal(&mut self, entry: &ProposedEntry) -> Result<(), BoxError> {
        let spec: RekordSpec =
            serde_json::from_value(entry.spec.clone()).map_err(RekordError::from)?;
        spec.validate()?;
        self.spec = Some(spec);
        Ok(())
    }

    fn api_version(&self) -> &str {
        API_VERSION
    }

    fn canonicalize(&self) -> Result<Vec<u8>, BoxError> {
        let spec = self.spec.as_ref().ok_or(RekordError::NotUnmarshaled)?;
        let canonical = ProposedEntry::new(KIND, API_VERSION, serde_json::to_value(spec)?);
        Ok(serde_json::to_vec(&canonical)?)
    }

    fn has_external_entities(&self) -> bool {
        self.spec
            .as_ref()
            .is_some_and(|s| s.data.content.is_none() && s.data.url.is_some())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
