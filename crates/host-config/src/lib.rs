//! Host Configuration Document
//!
//! Declarative description of the fleet the deployer provisions: backend
//! credentials, the candidate tag filter and, per named host, the desired disk
//! layout, interface layout and tags.
//!
//! The document is deserialized into raw entry types and then converted into
//! closed variant types (`DiskSpec`, `InterfaceSpec`), so malformed entries are
//! rejected at load time rather than during reconciliation.

pub mod disk;
pub mod document;
pub mod error;
pub mod flags;
pub mod host;
pub mod interface;
pub mod lifecycle;
pub mod ordered;
pub mod size;

pub use disk::*;
pub use document::*;
pub use error::HostConfigError;
pub use host::*;
pub use interface::*;
pub use lifecycle::*;
pub use ordered::OrderedMap;
pub use size::Percentage;
