use anyhow::{Context, Result};
use reqbench_common::{duration_serde, VariantName};
use reqbench_readiness::ReadinessConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod validation;

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub benchmark: BenchmarkOptions,
    pub servers: Vec<VariantConfig>,
    pub testers: Vec<VariantConfig>,
    pub pairings: Vec<PairingSpec>,
}

/// Benchmark-wide options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkOptions {
    #[serde(default = "default_title")]
    pub title: String,

    /// Free-form lines printed under the title
    #[serde(default)]
    pub description: Vec<String>,

    /// Budget for one tester run; exceeding it reports a timeout
    #[serde(default = "default_test_timeout", with = "duration_serde")]
    pub test_timeout: Duration,

    /// Wait granularity, and progress refresh rate in progress mode
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// How long a process gets to exit after the interrupt before it is killed
    #[serde(default = "default_shutdown_grace", with = "duration_serde")]
    pub shutdown_grace: Duration,

    /// Cap on the server readiness wait
    #[serde(default = "default_startup_timeout", with = "duration_serde")]
    pub startup_timeout: Duration,

    #[serde(default = "default_readiness_interval", with = "duration_serde")]
    pub readiness_interval: Duration,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Environment handed to every tester (suite size, request count, ...)
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: Vec::new(),
            test_timeout: default_test_timeout(),
            poll_interval: default_poll_interval(),
            shutdown_grace: default_shutdown_grace(),
            startup_timeout: default_startup_timeout(),
            readiness_interval: default_readiness_interval(),
            log_level: default_log_level(),
            parameters: BTreeMap::new(),
        }
    }
}

/// One server or tester definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: VariantName,

    /// Program followed by its arguments
    pub command: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Only meaningful for servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<ReadinessConfig>,

    #[serde(default)]
    pub output: OutputMode,
}

/// What happens to a variant's stdout/stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Keep the report readable
    #[default]
    Discard,
    Inherit,
}

/// Pairing declaration: either one explicit pair or a server × tester matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PairingSpec {
    Matrix { matrix: MatrixSpec },
    Single { server: VariantName, tester: VariantName },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSpec {
    pub servers: Vec<VariantName>,
    pub testers: Vec<VariantName>,
}

impl PairingSpec {
    /// Expand into (server, tester) pairs. Matrices iterate servers in the
    /// outer loop and testers in the inner loop.
    pub fn expand(&self) -> Vec<(VariantName, VariantName)> {
        match self {
            PairingSpec::Single { server, tester } => vec![(server.clone(), tester.clone())],
            PairingSpec::Matrix { matrix } => matrix
                .servers
                .iter()
                .flat_map(|server| {
                    matrix
                        .testers
                        .iter()
                        .map(move |tester| (server.clone(), tester.clone()))
                })
                .collect(),
        }
    }
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: BenchmarkConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// All pairings in run order
    pub fn expanded_pairings(&self) -> Vec<(VariantName, VariantName)> {
        self.pairings.iter().flat_map(PairingSpec::expand).collect()
    }

    pub fn server(&self, name: &VariantName) -> Option<&VariantConfig> {
        self.servers.iter().find(|v| &v.name == name)
    }

    pub fn tester(&self, name: &VariantName) -> Option<&VariantConfig> {
        self.testers.iter().find(|v| &v.name == name)
    }
}

// Default value functions
fn default_title() -> String {
    "Benchmark".to_string()
}

fn default_test_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_poll_interval() -> Duration {
    reqbench_process::POLL_INTERVAL
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(1)
}

fn default_startup_timeout() -> Duration {
    reqbench_process::DEFAULT_STARTUP_TIMEOUT
}

fn default_readiness_interval() -> Duration {
    reqbench_process::DEFAULT_READINESS_INTERVAL
}

fn default_log_level() -> String {
    "warn".to_string()
}
