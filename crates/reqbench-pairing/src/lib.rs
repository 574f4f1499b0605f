//! # reqbench pairing
//!
//! Benchmarks server/tester pairings.
//!
//! This crate provides:
//! - YAML configuration of variants and pairings (explicit pairs or matrices)
//! - [`ProcessGenerator`]: a named recipe that spawns one server or tester
//! - [`Orchestrator`]: runs one pairing, times the tester and tears both down
//! - [`BenchmarkRunner`]: runs all pairings in order and writes the report
//!
//! **Architecture:**
//! ```text
//! BenchmarkRunner ──► Orchestrator ──► ProcessGenerator ──► dyn ProcessControl
//!       │                  │
//!       ▼                  ▼
//!    Report          ProgressSink
//! ```

pub mod config;
pub mod generator;
pub mod orchestrator;
pub mod report;
pub mod runner;

pub use config::{BenchmarkConfig, BenchmarkOptions, MatrixSpec, OutputMode, PairingSpec, VariantConfig};
pub use generator::{CommandGenerator, ProcessGenerator};
pub use orchestrator::{
    NoProgress, Orchestrator, OrchestratorOptions, Pairing, PairingFailure, PairingOutcome, PairingResult,
    ProgressSink, WaitMode,
};
pub use report::{Report, TerminalProgress};
pub use runner::{BenchmarkPlan, BenchmarkRunner, RunSummary};
