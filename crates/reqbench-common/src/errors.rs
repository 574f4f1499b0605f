//! Error types for process control.
//!
//! Every failure that can happen while bringing a benchmark process up is a
//! [`ProcessError`]. Operations on an already running process (poll, wait,
//! interrupt, kill) do not fail, so they have no error type at all.

use std::time::Duration;
use thiserror::Error;

/// Process-specific error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The OS refused to start the process (missing executable, permissions).
    #[error("Process spawn failed: {command} - {reason}")]
    SpawnFailed { command: String, reason: String },

    /// The readiness check never succeeded within the startup bound.
    #[error("Process startup timeout: {id} - not ready after {timeout:?}")]
    StartupTimeout { id: String, timeout: Duration },

    /// The process terminated while its readiness check was still pending.
    #[error("Process exited before becoming ready: {id} - exit code {exit_code}")]
    ExitedBeforeReady { id: String, exit_code: i32 },

    #[error("Invalid command for process {id}: {reason}")]
    InvalidCommand { id: String, reason: String },
}

impl ProcessError {
    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn startup_timeout(id: impl Into<String>, timeout: Duration) -> Self {
        Self::StartupTimeout {
            id: id.into(),
            timeout,
        }
    }

    pub fn exited_before_ready(id: impl Into<String>, exit_code: i32) -> Self {
        Self::ExitedBeforeReady {
            id: id.into(),
            exit_code,
        }
    }

    pub fn invalid_command(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the process never reached a serving state (as opposed to never
    /// being started at all).
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::StartupTimeout { .. } | Self::ExitedBeforeReady { .. }
        )
    }
}

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_construction() {
        let error = ProcessError::spawn_failed("does-not-exist --flag", "No such file or directory");
        assert!(matches!(error, ProcessError::SpawnFailed { .. }));
        assert_eq!(
            error.to_string(),
            "Process spawn failed: does-not-exist --flag - No such file or directory"
        );

        let error = ProcessError::startup_timeout("flask_jsonify", Duration::from_secs(3));
        assert!(error.to_string().contains("not ready after 3s"));
    }

    #[test]
    fn test_startup_failure_classification() {
        assert!(ProcessError::startup_timeout("s", Duration::from_millis(10)).is_startup_failure());
        assert!(ProcessError::exited_before_ready("s", 1).is_startup_failure());
        assert!(!ProcessError::spawn_failed("s", "boom").is_startup_failure());
        assert!(!ProcessError::invalid_command("s", "empty").is_startup_failure());
    }
}
