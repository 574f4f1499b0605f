//! ProcessHandle - exclusive owner of one spawned process.
//!
//! Waiting is a fixed-interval poll loop over `try_wait`, not a blocking
//! wait-with-timeout. Every wait therefore returns control to the caller at
//! least once per [`POLL_INTERVAL`], which is also the precision bound on any
//! duration measured around it.

use crate::control::ProcessControl;
use crate::readiness::ReadinessCheck;
use crate::signal;
use crate::spawn::SpawnSpec;
use crate::status::ProcessStatus;
use crate::validation::validate_command;
use async_trait::async_trait;
use reqbench_common::{ProcessError, ProcessResult};
use std::time::Duration;
use tokio::process::Child;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Granularity of [`ProcessHandle::wait`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const DROP_REAP_TIMEOUT: Duration = Duration::from_millis(100);

/// Handle to one spawned process.
///
/// The process leads its own process group. [`ProcessControl::kill`] and
/// `Drop` target the whole group, including members that outlive the leader.
pub struct ProcessHandle {
    label: String,
    command_line: String,
    pid: u32,
    child: Child,
    status: ProcessStatus,
    poll_interval: Duration,
    /// Set once a group signal reports that no member is left.
    group_gone: bool,
}

impl ProcessHandle {
    /// Spawn the process described by `spec`.
    ///
    /// Returns as soon as the OS has started the process, unless `spec`
    /// carries a readiness check: then the caller is suspended, checking every
    /// `readiness_interval`, until the check passes. The wait is capped by
    /// `startup_timeout`; on expiry the process is killed and reaped and
    /// [`ProcessError::StartupTimeout`] is returned.
    pub async fn spawn(spec: SpawnSpec) -> ProcessResult<Self> {
        validate_command(&spec.label, &spec.command)?;

        let command_line = spec.command_line();
        let child = spec
            .build_command()
            .spawn()
            .map_err(|e| ProcessError::spawn_failed(command_line.clone(), e.to_string()))?;

        let Some(pid) = child.id() else {
            return Err(ProcessError::spawn_failed(
                command_line,
                "process exited before its PID could be read",
            ));
        };

        info!("Spawned {} (PID: {}): {}", spec.label, pid, command_line);

        let mut handle = Self {
            label: spec.label.clone(),
            command_line,
            pid,
            child,
            status: ProcessStatus::Running,
            poll_interval: spec.poll_interval,
            group_gone: false,
        };

        if let Some(check) = spec.readiness.as_deref() {
            handle
                .await_readiness(check, spec.readiness_interval, spec.startup_timeout)
                .await?;
        }

        Ok(handle)
    }

    async fn await_readiness(
        &mut self,
        check: &dyn ReadinessCheck,
        interval: Duration,
        startup_timeout: Duration,
    ) -> ProcessResult<()> {
        let started = Instant::now();
        let deadline = started + startup_timeout;
        debug!("Waiting for {} to become ready ({})", self.label, check.describe());

        loop {
            if let ProcessStatus::Exited(code) = self.poll() {
                warn!("{} exited with code {} before becoming ready", self.label, code);
                return Err(ProcessError::exited_before_ready(&self.label, code));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let ready = !remaining.is_zero()
                && tokio::time::timeout(remaining, check.is_ready())
                    .await
                    .unwrap_or(false);
            if ready {
                info!("{} is ready after {:?}", self.label, started.elapsed());
                return Ok(());
            }

            if Instant::now() >= deadline {
                warn!(
                    "{} did not become ready within {:?}, killing it",
                    self.label, startup_timeout
                );
                self.kill();
                self.wait(None).await;
                return Err(ProcessError::startup_timeout(&self.label, startup_timeout));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(interval.min(remaining)).await;
        }
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Last observed status, without querying the OS.
    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    fn record_exit(&mut self, exit: std::process::ExitStatus) -> ProcessStatus {
        let status = ProcessStatus::from(exit);
        if status.success() {
            info!("{} (PID: {}) exited successfully", self.label, self.pid);
        } else {
            info!("{} (PID: {}) exited with {}", self.label, self.pid, status);
        }
        self.status = status;
        status
    }

    /// Signal the process group. A group ID is not reused while any member
    /// is alive, so this stays valid after the leader has been reaped.
    fn send(&mut self, name: &str, send: fn(u32) -> std::io::Result<()>) {
        if self.group_gone {
            debug!("Not sending {} to {}: process group is empty", name, self.label);
            return;
        }

        debug!("Sending {} to {} (PGID: {})", name, self.label, self.pid);
        match send(self.pid) {
            Ok(()) => {}
            Err(e) if signal::is_already_gone(&e) => {
                debug!("{} (PGID: {}) has no processes left", self.label, self.pid);
                self.group_gone = true;
            }
            Err(e) => {
                debug!("Failed to send {} to {} (PID: {}): {}", name, self.label, self.pid, e);
            }
        }
    }
}

#[async_trait]
impl ProcessControl for ProcessHandle {
    fn label(&self) -> &str {
        &self.label
    }

    fn pid(&self) -> u32 {
        self.pid
    }

    fn poll(&mut self) -> ProcessStatus {
        if !self.status.is_running() {
            return self.status;
        }

        match self.child.try_wait() {
            Ok(Some(exit)) => self.record_exit(exit),
            Ok(None) => ProcessStatus::Running,
            Err(e) => {
                warn!("Failed to poll {} (PID: {}): {}", self.label, self.pid, e);
                ProcessStatus::Running
            }
        }
    }

    async fn wait(&mut self, timeout: Option<Duration>) -> ProcessStatus {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let status = self.poll();
            if !status.is_running() {
                return status;
            }

            let pause = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return ProcessStatus::Running;
                    }
                    self.poll_interval.min(remaining)
                }
                None => self.poll_interval,
            };
            tokio::time::sleep(pause).await;
        }
    }

    fn interrupt(&mut self) {
        // Once the leader is gone the interrupt has nothing cooperative to ask;
        // leftover group members are handled by `kill`.
        if !self.poll().is_running() {
            debug!("Not interrupting {}: already exited", self.label);
            return;
        }
        self.send("interrupt", signal::send_interrupt);
    }

    fn kill(&mut self) {
        #[cfg(unix)]
        {
            self.send("kill", signal::force_kill);
        }

        #[cfg(not(unix))]
        {
            if self.poll().is_running() {
                if let Err(e) = self.child.start_kill() {
                    debug!("Failed to kill {} (PID: {}): {}", self.label, self.pid, e);
                }
            }
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        let running = self.poll().is_running();
        if running {
            warn!(
                "{} (PID: {}) still running when its handle was dropped, killing it",
                self.label, self.pid
            );
        }
        self.kill();

        if running {
            // Last resort only: this blocks the runtime thread for up to
            // DROP_REAP_TIMEOUT. Anything slower is left to tokio's orphan reaper.
            let deadline = std::time::Instant::now() + DROP_REAP_TIMEOUT;
            while self.poll().is_running() && std::time::Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
    }
}
