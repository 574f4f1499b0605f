//! Process generators.
//!
//! A generator is a named recipe that, given extra environment variables,
//! spawns a process and returns control over it. Servers carry their
//! readiness check inside the recipe, so for them `spawn` only returns once
//! the server is serving.

use crate::config::{BenchmarkOptions, OutputMode, VariantConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqbench_common::{ProcessResult, Role, VariantName};
use reqbench_process::{ProcessControl, ProcessHandle, SpawnSpec, StdioMode};
use std::collections::BTreeMap;

#[async_trait]
pub trait ProcessGenerator: Send + Sync {
    fn name(&self) -> &VariantName;

    fn role(&self) -> Role;

    /// Spawn a fresh process with `environment` layered over the variant's
    /// own environment.
    async fn spawn(&self, environment: &BTreeMap<String, String>) -> ProcessResult<Box<dyn ProcessControl>>;
}

/// Generator backed by a command line from configuration.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    name: VariantName,
    role: Role,
    spec: SpawnSpec,
}

impl CommandGenerator {
    pub fn new(name: VariantName, role: Role, spec: SpawnSpec) -> Self {
        Self { name, role, spec }
    }

    /// Build a generator from a variant definition and the benchmark options
    /// (startup bound, readiness cadence, wait granularity).
    pub fn from_config(variant: &VariantConfig, role: Role, options: &BenchmarkOptions) -> Result<Self> {
        let label = format!("{} {}", role, variant.name);
        let mut spec = SpawnSpec::new(label, variant.command.iter().cloned())
            .with_envs(variant.environment.clone())
            .with_stdio(match variant.output {
                OutputMode::Discard => StdioMode::Null,
                OutputMode::Inherit => StdioMode::Inherit,
            })
            .with_startup_timeout(options.startup_timeout)
            .with_readiness_interval(options.readiness_interval)
            .with_poll_interval(options.poll_interval);

        if let Some(ref dir) = variant.working_directory {
            spec = spec.with_working_directory(dir);
        }

        if let Some(ref readiness) = variant.readiness {
            let check = readiness
                .build()
                .with_context(|| format!("Invalid readiness check for {}", variant.name))?;
            spec = spec.with_readiness(check);
        }

        Ok(Self::new(variant.name.clone(), role, spec))
    }

    pub fn spec(&self) -> &SpawnSpec {
        &self.spec
    }
}

#[async_trait]
impl ProcessGenerator for CommandGenerator {
    fn name(&self) -> &VariantName {
        &self.name
    }

    fn role(&self) -> Role {
        self.role
    }

    async fn spawn(&self, environment: &BTreeMap<String, String>) -> ProcessResult<Box<dyn ProcessControl>> {
        let spec = self.spec.clone().with_envs(environment.clone());
        let handle = ProcessHandle::spawn(spec).await?;
        Ok(Box::new(handle))
    }
}
