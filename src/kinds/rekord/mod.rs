//! The "rekord" kind: a signed artifact record
//!
//! Versions:
//! - `>=0.0.1 <0.0.2` → [`v0_0_1::RekordEntry`]

pub mod v0_0_1;

use crate::error::Result;
use crate::kind::{EntryImpl, VersionedKind};
use crate::registry::KindRegistry;

pub const KIND: &str = "rekord";

/// Build the rekord handler with all of its schema versions bound
pub fn handler() -> Result<VersionedKind> {
    let kind = VersionedKind::new(KIND);
    kind.register_version(v0_0_1::CONSTRAINT, || {
        Some(Box::new(v0_0_1::RekordEntry::default()) as Box<dyn EntryImpl>)
    })?;
    Ok(kind)
}

/// Register the rekord kind with `registry`
pub fn register(registry: &KindRegistry) -> Result<()> {
    registry.register(handler()?);
    Ok(())
}
