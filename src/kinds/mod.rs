//! Entry kinds shipped with this crate

pub mod rekord;

use crate::error::Result;
use crate::registry::KindRegistry;

/// Register every built-in kind with `registry`
pub fn register_builtin(registry: &KindRegistry) -> Result<()> {
    rekord::register(registry)?;
    Ok(())
}
