//! # reqbench common
//!
//! Types shared by every reqbench crate: the process error taxonomy, the
//! identifiers used to name server and tester variants, and the duration
//! format used in configuration files.

pub mod duration_serde;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{ProcessError, ProcessResult};
pub use types::{Role, VariantName};
