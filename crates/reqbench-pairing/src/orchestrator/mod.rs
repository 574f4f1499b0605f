//! Pairing orchestrator.
//!
//! Runs one server + tester pairing end to end:
//!
//! ```text
//! spawn server (readiness wait) ─► start clock ─► spawn tester
//!       ─► wait on tester (silent | progress) ─► stop clock
//!       ─► [timeout/cancel: interrupt tester]
//!       ─► server teardown: interrupt ─► grace wait ─► kill ─► reap
//!       ─► tester reap (grace measured from its interrupt) ─► outcome
//! ```
//!
//! The kill goes to the whole process group and is sent even when the group
//! leader already exited, so helpers a wrapper script left behind do not
//! outlive their pairing.
//!
//! Server start always precedes tester start, the tester is always done
//! (or interrupted) before server teardown begins, and every interrupt
//! precedes the corresponding kill.

use crate::generator::ProcessGenerator;
use reqbench_common::{ProcessError, Role, VariantName};
use reqbench_process::{ProcessControl, ProcessStatus};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};


/// How the orchestrator waits on the tester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// One bounded wait for the whole test budget.
    #[default]
    Silent,
    /// Short waits of `poll_interval`, reporting progress after each one.
    Progress,
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub test_timeout: Duration,
    pub poll_interval: Duration,
    pub shutdown_grace: Duration,
    pub mode: WaitMode,
    /// Environment handed to every tester generator.
    pub tester_environment: BTreeMap<String, String>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            test_timeout: Duration::from_secs(120),
            poll_interval: reqbench_process::POLL_INTERVAL,
            shutdown_grace: Duration::from_secs(1),
            mode: WaitMode::Silent,
            tester_environment: BTreeMap::new(),
        }
    }
}

/// Receives live updates while a tester runs in progress mode.
pub trait ProgressSink {
    fn update(&mut self, server: &VariantName, tester: &VariantName, elapsed: Duration);

    /// Called once the pairing's wait phase is over.
    fn finish(&mut self) {}
}

/// Progress sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _server: &VariantName, _tester: &VariantName, _elapsed: Duration) {}
}

/// One server/tester combination.
#[derive(Clone)]
pub struct Pairing {
    pub server: Arc<dyn ProcessGenerator>,
    pub tester: Arc<dyn ProcessGenerator>,
}

impl fmt::Debug for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pairing")
            .field("server", self.server.name())
            .field("tester", self.tester.name())
            .finish()
    }
}

/// Why a pairing produced no measurement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairingFailure {
    /// Server or tester could not be started at all.
    #[error("{role} could not be spawned: {source}")]
    Spawn { role: Role, source: ProcessError },

    /// Server started but never became ready.
    #[error("server did not become ready: {source}")]
    Startup { source: ProcessError },

    /// Tester ran to completion but reported failure.
    #[error("tester exited with code {exit_code}")]
    NonZeroExit { exit_code: i32 },
}

impl PairingFailure {
    fn from_spawn_error(role: Role, source: ProcessError) -> Self {
        if role == Role::Server && source.is_startup_failure() {
            PairingFailure::Startup { source }
        } else {
            PairingFailure::Spawn { role, source }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    /// Tester exited 0; wall-clock time from tester spawn to exit.
    Success(Duration),
    /// Tester exceeded the budget (the configured timeout).
    Timeout(Duration),
    Error(PairingFailure),
    /// The operator interrupted the run while this pairing was in flight.
    Aborted,
}

impl PairingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PairingOutcome::Success(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingResult {
    pub server: VariantName,
    pub tester: VariantName,
    pub outcome: PairingOutcome,
}

/// How the tester wait phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TesterWatch {
    Exited(i32),
    TimedOut,
    Cancelled,
}

pub struct Orchestrator {
    options: OrchestratorOptions,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(options: OrchestratorOptions, cancel: CancellationToken) -> Self {
        Self { options, cancel }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Run one pairing to completion, timeout or cancellation. Never fails:
    /// every problem becomes the pairing's outcome.
    pub async fn run_pairing(&self, pairing: &Pairing, progress: &mut dyn ProgressSink) -> PairingResult {
        let server_name = pairing.server.name().clone();
        let tester_name = pairing.tester.name().clone();
        info!("Starting pairing: server={} tester={}", server_name, tester_name);

        let outcome = self.run(pairing, progress).await;
        match &outcome {
            PairingOutcome::Success(duration) => {
                info!("Pairing {} / {} finished in {:?}", server_name, tester_name, duration)
            }
            PairingOutcome::Timeout(budget) => {
                warn!("Pairing {} / {} timed out after {:?}", server_name, tester_name, budget)
            }
            PairingOutcome::Error(failure) => {
                warn!("Pairing {} / {} failed: {}", server_name, tester_name, failure)
            }
            PairingOutcome::Aborted => warn!("Pairing {} / {} aborted", server_name, tester_name),
        }

        PairingResult {
            server: server_name,
            tester: tester_name,
            outcome,
        }
    }

    async fn run(&self, pairing: &Pairing, progress: &mut dyn ProgressSink) -> PairingOutcome {
        // A spawn future dropped on cancellation drops its half-started
        // handle, which kills the process.
        let server_environment = BTreeMap::new();
        let spawned = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return PairingOutcome::Aborted,
            spawned = pairing.server.spawn(&server_environment) => spawned,
        };
        let mut server = match spawned {
            Ok(server) => server,
            Err(e) => return PairingOutcome::Error(PairingFailure::from_spawn_error(Role::Server, e)),
        };

        let started = Instant::now();
        let mut tester = match pairing.tester.spawn(&self.options.tester_environment).await {
            Ok(tester) => tester,
            Err(e) => {
                self.teardown(server.as_mut()).await;
                return PairingOutcome::Error(PairingFailure::from_spawn_error(Role::Tester, e));
            }
        };

        let watch = self
            .watch_tester(tester.as_mut(), started, pairing, progress)
            .await;
        progress.finish();

        let interrupted_at = match watch {
            TesterWatch::Exited(_) => {
                tester.kill();
                None
            }
            TesterWatch::TimedOut | TesterWatch::Cancelled => {
                tester.interrupt();
                Some(Instant::now())
            }
        };
        let duration = started.elapsed();

        self.teardown(server.as_mut()).await;

        if let Some(interrupted_at) = interrupted_at {
            let grace = self.options.shutdown_grace.saturating_sub(interrupted_at.elapsed());
            self.stop_after_grace(tester.as_mut(), grace).await;
        }

        match watch {
            TesterWatch::TimedOut => PairingOutcome::Timeout(self.options.test_timeout),
            TesterWatch::Cancelled => PairingOutcome::Aborted,
            TesterWatch::Exited(0) => PairingOutcome::Success(duration),
            TesterWatch::Exited(exit_code) => PairingOutcome::Error(PairingFailure::NonZeroExit { exit_code }),
        }
    }

    async fn watch_tester(
        &self,
        tester: &mut dyn ProcessControl,
        started: Instant,
        pairing: &Pairing,
        progress: &mut dyn ProgressSink,
    ) -> TesterWatch {
        let budget = self.options.test_timeout;

        match self.options.mode {
            WaitMode::Silent => {
                let remaining = budget.saturating_sub(started.elapsed());
                let status = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return TesterWatch::Cancelled,
                    status = tester.wait(Some(remaining)) => status,
                };
                match status {
                    ProcessStatus::Exited(code) => TesterWatch::Exited(code),
                    ProcessStatus::Running => TesterWatch::TimedOut,
                }
            }
            WaitMode::Progress => loop {
                let status = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return TesterWatch::Cancelled,
                    status = tester.wait(Some(self.options.poll_interval)) => status,
                };
                if let ProcessStatus::Exited(code) = status {
                    return TesterWatch::Exited(code);
                }

                let elapsed = started.elapsed();
                if elapsed > budget {
                    return TesterWatch::TimedOut;
                }
                progress.update(pairing.server.name(), pairing.tester.name(), elapsed);
            },
        }
    }

    /// Interrupt, grant the grace period, then kill and reap.
    async fn teardown(&self, process: &mut dyn ProcessControl) {
        debug!("Tearing down {} (PID: {})", process.label(), process.pid());
        process.interrupt();
        self.stop_after_grace(process, self.options.shutdown_grace).await;
    }

    /// Wait up to `grace` for an already interrupted process, kill what is
    /// left of its process group, then reap it.
    async fn stop_after_grace(&self, process: &mut dyn ProcessControl, grace: Duration) {
        if process.wait(Some(grace)).await.is_running() {
            warn!(
                "{} (PID: {}) ignored the interrupt for {:?}, killing it",
                process.label(),
                process.pid(),
                self.options.shutdown_grace
            );
        }
        process.kill();
        let status = process.wait(None).await;
        debug!("{} reaped: {}", process.label(), status);
    }
}
