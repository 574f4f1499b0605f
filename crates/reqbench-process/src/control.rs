//! ProcessControl trait - the seam between pairing logic and real processes.
//!
//! The orchestrator only ever talks to `dyn ProcessControl`, which lets tests
//! drive it with scripted fakes instead of OS processes.

use crate::status::ProcessStatus;
use async_trait::async_trait;
use std::time::Duration;

/// Control surface of one spawned process.
///
/// None of these operations fail: once a process exists, every question about
/// it has an answer and every signal is best-effort.
#[async_trait]
pub trait ProcessControl: Send {
    /// Name used in logs.
    fn label(&self) -> &str;

    /// OS process ID.
    fn pid(&self) -> u32;

    /// Non-blocking status check.
    fn poll(&mut self) -> ProcessStatus;

    /// Wait until the process exits or `timeout` elapses, whichever is first.
    /// `None` waits for as long as it takes.
    ///
    /// Must be cancel-safe: dropping the future mid-wait loses no state.
    async fn wait(&mut self, timeout: Option<Duration>) -> ProcessStatus;

    /// Send the graceful interrupt. Does not wait. No-op once exited.
    fn interrupt(&mut self);

    /// Send the forced kill. Does not wait. Also reaches processes the
    /// target left behind after it exited; no-op once none are left.
    fn kill(&mut self);
}
