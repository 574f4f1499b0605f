use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use reqbench_pairing::{
    BenchmarkConfig, BenchmarkPlan, BenchmarkRunner, NoProgress, Report, TerminalProgress, WaitMode,
};

/// Exit status after an operator interrupt (128 + SIGINT).
const EXIT_ABORTED: u8 = 130;

/// reqbench - benchmark server/tester pairings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Show a live duration line on stderr while each tester runs
    #[arg(long)]
    progress: bool,

    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE", default_value = "reqbench.yaml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = BenchmarkConfig::load_from_file(&args.config);
    let level = match (&config, args.debug) {
        (_, true) => "debug",
        (Ok(config), false) => config.benchmark.log_level.as_str(),
        (Err(_), false) => "warn",
    };
    initialize_logging(level);

    let config = config?;
    info!("Config file: {}", args.config);

    let plan = BenchmarkPlan::from_config(&config)?;
    info!("Loaded {} pairings", plan.pairings.len());

    let cancel = CancellationToken::new();
    let signals = ShutdownSignals::install().context("Failed to install signal handlers")?;
    let forwarder = tokio::spawn(signals.forward(cancel.clone()));

    let mode = if args.progress { WaitMode::Progress } else { WaitMode::Silent };
    let runner = BenchmarkRunner::new(plan, mode, cancel);
    let mut report = Report::new(std::io::stdout());

    let summary = match mode {
        WaitMode::Progress => runner.run(&mut report, &mut TerminalProgress::stderr()).await?,
        WaitMode::Silent => runner.run(&mut report, &mut NoProgress).await?,
    };
    forwarder.abort();

    if summary.aborted {
        return Ok(ExitCode::from(EXIT_ABORTED));
    }
    Ok(ExitCode::SUCCESS)
}

fn initialize_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Handlers for the operator's interrupt, installed before the first
/// process is spawned so an early Ctrl-C never hits the default handler.
struct ShutdownSignals {
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                sigterm: signal(SignalKind::terminate())?,
                sigint: signal(SignalKind::interrupt())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// The first signal cancels the run and lets the running pairing shut
    /// down in order. A second one exits on the spot.
    async fn forward(mut self, cancel: CancellationToken) {
        self.recv().await;
        warn!("Interrupted, stopping the running pairing (interrupt again to exit now)");
        cancel.cancel();

        self.recv().await;
        warn!("Interrupted again, exiting without waiting for shutdown");
        std::process::exit(i32::from(EXIT_ABORTED));
    }

    #[cfg(unix)]
    async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = self.sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}
