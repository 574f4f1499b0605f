//! Readiness check contract.
//!
//! A readiness check answers one question, "is the server serving yet?". It
//! is polled at a fixed interval right after spawn; concrete probes live in
//! the `reqbench-readiness` crate.

use async_trait::async_trait;

#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Returns true once the process is ready to accept work. Must not hang:
    /// implementations bound their own I/O.
    async fn is_ready(&self) -> bool;

    /// Short description for logs, e.g. `http GET http://127.0.0.1:5001/`.
    fn describe(&self) -> String;
}
