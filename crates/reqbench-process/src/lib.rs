//! # reqbench process
//!
//! Low-level process control for benchmark pairings.
//!
//! This crate provides:
//! - [`ProcessHandle`]: one spawned process, owned exclusively
//! - Non-blocking polling and bounded, poll-based waiting
//! - Graceful interrupt (SIGINT) and forced kill (SIGKILL) as separate primitives
//! - The [`ProcessControl`] trait so higher layers can substitute fakes
//! - The [`ReadinessCheck`] contract polled while a server starts
//!
//! **Architecture:**
//! ```text
//! Orchestrator (pairing logic)
//!       ↓ uses
//! ProcessControl trait (interface)
//!       ↓ implemented by
//! ProcessHandle (tokio child + signal primitives)
//! ```

pub mod check;
pub mod control;
pub mod handle;
pub mod readiness;
pub mod signal;
pub mod spawn;
pub mod status;
pub mod validation;

// Re-export main types
pub use check::process_exists;
pub use control::ProcessControl;
pub use handle::{ProcessHandle, POLL_INTERVAL};
pub use readiness::ReadinessCheck;
pub use spawn::{SpawnSpec, StdioMode, DEFAULT_READINESS_INTERVAL, DEFAULT_STARTUP_TIMEOUT};
pub use status::ProcessStatus;
pub use validation::validate_command;
