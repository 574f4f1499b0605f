use super::*;
use anyhow::{anyhow, Result};
use std::collections::HashSet;

/// Validate the complete configuration
pub fn validate_config(config: &BenchmarkConfig) -> Result<()> {
    validate_benchmark_options(&config.benchmark)?;
    validate_variants("server", &config.servers)?;
    validate_variants("tester", &config.testers)?;
    validate_pairings(config)?;

    for tester in &config.testers {
        if tester.readiness.is_some() {
            return Err(anyhow!(
                "Tester {} declares a readiness check; only servers are waited on",
                tester.name
            ));
        }
    }

    Ok(())
}

/// Validate benchmark-wide options
fn validate_benchmark_options(options: &BenchmarkOptions) -> Result<()> {
    if options.test_timeout.is_zero() {
        return Err(anyhow!("Test timeout must be greater than 0"));
    }

    if options.poll_interval.is_zero() {
        return Err(anyhow!("Poll interval must be greater than 0"));
    }

    if options.poll_interval > options.test_timeout {
        return Err(anyhow!(
            "Poll interval ({:?}) cannot exceed the test timeout ({:?})",
            options.poll_interval,
            options.test_timeout
        ));
    }

    if options.startup_timeout.is_zero() {
        return Err(anyhow!("Startup timeout must be greater than 0"));
    }

    if options.readiness_interval.is_zero() {
        return Err(anyhow!("Readiness interval must be greater than 0"));
    }

    for key in options.parameters.keys() {
        validate_env_key(key)?;
    }

    match options.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(anyhow!(
            "Invalid log level: {}, must be one of: trace, debug, info, warn, error",
            options.log_level
        )),
    }
}

/// Validate all variants of one role
fn validate_variants(role: &str, variants: &[VariantConfig]) -> Result<()> {
    if variants.is_empty() {
        return Err(anyhow!("At least one {} must be configured", role));
    }

    let mut names = HashSet::new();
    for variant in variants {
        if !names.insert(&variant.name) {
            return Err(anyhow!("Duplicate {} name: {}", role, variant.name));
        }

        validate_variant(variant)?;
    }

    Ok(())
}

/// Validate a single variant
fn validate_variant(variant: &VariantConfig) -> Result<()> {
    let name = variant.name.as_str();
    if name.is_empty() {
        return Err(anyhow!("Variant name cannot be empty"));
    }

    if name.len() > 64 {
        return Err(anyhow!("Variant name too long (max 64 characters): {}", name));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(anyhow!(
            "Variant name can only contain alphanumeric characters, hyphens, and underscores: {}",
            name
        ));
    }

    reqbench_process::validate_command(name, &variant.command)?;

    for key in variant.environment.keys() {
        validate_env_key(key)?;
    }

    if let Some(ref readiness) = variant.readiness {
        readiness
            .build()
            .map_err(|e| anyhow!("Invalid readiness check for {}: {}", name, e))?;
    }

    Ok(())
}

fn validate_env_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains('=') || key.contains('\0') {
        return Err(anyhow!("Invalid environment variable name: {:?}", key));
    }
    Ok(())
}

/// Validate that every pairing references declared variants
fn validate_pairings(config: &BenchmarkConfig) -> Result<()> {
    let pairs = config.expanded_pairings();
    if pairs.is_empty() {
        return Err(anyhow!("At least one pairing must be configured"));
    }

    for (server, tester) in &pairs {
        if config.server(server).is_none() {
            return Err(anyhow!("Pairing references unknown server: {}", server));
        }
        if config.tester(tester).is_none() {
            return Err(anyhow!("Pairing references unknown tester: {}", tester));
        }
    }

    Ok(())
}
