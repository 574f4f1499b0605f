//! Benchmark runner: resolves configured pairings into generators and runs
//! them one after another, reporting each row as soon as it is known.

use crate::config::{BenchmarkConfig, BenchmarkOptions};
use crate::generator::{CommandGenerator, ProcessGenerator};
use crate::orchestrator::{
    Orchestrator, OrchestratorOptions, Pairing, PairingOutcome, PairingResult, ProgressSink, WaitMode,
};
use crate::report::Report;
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use reqbench_common::{Role, VariantName};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolved pairings plus the options they run under.
pub struct BenchmarkPlan {
    pub options: BenchmarkOptions,
    pub pairings: Vec<Pairing>,
}

impl BenchmarkPlan {
    pub fn new(options: BenchmarkOptions, pairings: Vec<Pairing>) -> Self {
        Self { options, pairings }
    }

    /// Build one generator per declared variant and resolve every pairing
    /// against them. Generators are shared between pairings.
    pub fn from_config(config: &BenchmarkConfig) -> Result<Self> {
        let servers = generators(config, Role::Server)?;
        let testers = generators(config, Role::Tester)?;

        let pairings = config
            .expanded_pairings()
            .into_iter()
            .map(|(server, tester)| {
                let server = servers
                    .get(&server)
                    .cloned()
                    .ok_or_else(|| anyhow!("Pairing references unknown server: {}", server))?;
                let tester = testers
                    .get(&tester)
                    .cloned()
                    .ok_or_else(|| anyhow!("Pairing references unknown tester: {}", tester))?;
                Ok(Pairing { server, tester })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(config.benchmark.clone(), pairings))
    }
}

fn generators(config: &BenchmarkConfig, role: Role) -> Result<HashMap<VariantName, Arc<dyn ProcessGenerator>>> {
    let variants = match role {
        Role::Server => &config.servers,
        Role::Tester => &config.testers,
    };

    variants
        .iter()
        .map(|variant| {
            let generator = CommandGenerator::from_config(variant, role, &config.benchmark)
                .with_context(|| format!("Failed to set up {} {}", role, variant.name))?;
            Ok((variant.name.clone(), Arc::new(generator) as Arc<dyn ProcessGenerator>))
        })
        .collect()
}

/// Results of one benchmark run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<PairingResult>,
    /// The operator interrupted the run; later pairings were skipped.
    pub aborted: bool,
}

impl RunSummary {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }
}

pub struct BenchmarkRunner {
    plan: BenchmarkPlan,
    orchestrator: Orchestrator,
    cancel: CancellationToken,
}

impl BenchmarkRunner {
    pub fn new(plan: BenchmarkPlan, mode: WaitMode, cancel: CancellationToken) -> Self {
        let options = OrchestratorOptions {
            test_timeout: plan.options.test_timeout,
            poll_interval: plan.options.poll_interval,
            shutdown_grace: plan.options.shutdown_grace,
            mode,
            tester_environment: plan.options.parameters.clone(),
        };

        Self {
            orchestrator: Orchestrator::new(options, cancel.clone()),
            plan,
            cancel,
        }
    }

    /// Run every pairing in order. Only report write failures are errors;
    /// pairing failures end up in the summary.
    pub async fn run<W: Write>(&self, report: &mut Report<W>, progress: &mut dyn ProgressSink) -> Result<RunSummary> {
        report
            .preamble(&self.plan.options, Local::now().naive_local())
            .context("Failed to write report preamble")?;
        report.header().context("Failed to write report header")?;

        let total = self.plan.pairings.len();
        let mut summary = RunSummary::default();

        for (index, pairing) in self.plan.pairings.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.aborted = true;
                break;
            }

            info!("Running pairing {}/{}", index + 1, total);
            let result = self.orchestrator.run_pairing(pairing, progress).await;
            report.row(&result).context("Failed to write report row")?;

            let aborted = result.outcome == PairingOutcome::Aborted;
            summary.results.push(result);
            if aborted {
                summary.aborted = true;
                break;
            }
        }

        if summary.aborted {
            warn!(
                "Benchmark aborted after {} of {} pairings",
                summary.results.len(),
                total
            );
            report.aborted().context("Failed to write report")?;
        } else {
            info!(
                "Benchmark finished: {} of {} pairings succeeded",
                summary.successes(),
                total
            );
        }

        Ok(summary)
    }
}
