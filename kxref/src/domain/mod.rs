//! Domain model for kxref
//!
//! Identifiers, kernel version parsing and the error enums every layer
//! returns. The row formats themselves live in `kxref-common`.

pub mod errors;
pub mod types;

pub use types::{normalize_symbol, InstanceId, KernelVersion};

pub use errors::{ConfigError, PipelineError, ResolveError, ScanError, SinkError};
