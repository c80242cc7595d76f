//! Rekor Entry Types
//!
//! Resolves proposed transparency-log entries into validated, strongly
//! typed objects. Every entry declares a **kind** and, within that kind, a
//! schema **version**; the registry picks the implementation for both.
//!
//! ## Dispatch
//!
//! ```text
//! ProposedEntry { kind, apiVersion, spec }
//!   └─ KindRegistry::unmarshal
//!        └─ lookup(kind) → KindHandler
//!             └─ VersionResolver::get(apiVersion) → factory
//!                  └─ factory() → EntryImpl::unmarshal(spec)
//! ```
//!
//! Within a kind, version constraints are checked in registration order
//! and the first range containing the declared version wins.
//!
//! ## Example
//!
//! ```no_run
//! use rekor_types::{KindRegistry, ProposedEntry};
//!
//! let registry = KindRegistry::with_builtin_kinds()?;
//! let entry = ProposedEntry::from_json(r#"{"kind":"rekord","apiVersion":"0.0.1","spec":{}}"#)?;
//! match registry.unmarshal(&entry) {
//!     Ok(object) => println!("accepted {}", object.api_version()),
//!     Err(e) => eprintln!("rejected: {}", e),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod checksum;
pub mod config;
pub mod entry;
pub mod error;
pub mod kind;
pub mod kinds;
pub mod registry;
pub mod resolver;
pub mod version;

pub use checksum::Checksum;
pub use config::RekorConfig;
pub use entry::ProposedEntry;
pub use error::{BoxError, RegistryError, Result};
pub use kind::{EntryImpl, KindHandler, VersionedKind};
pub use registry::KindRegistry;
pub use resolver::{VersionFactory, VersionResolver};
pub use version::{RangeError, VersionRange};
