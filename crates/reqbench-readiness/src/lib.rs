//! # reqbench readiness
//!
//! Readiness probes polled while a benchmark server starts up.
//!
//! This crate provides:
//! - HTTP probes (any HTTP response means "serving")
//! - TCP probes (an accepted connection means "serving")
//! - Closure-backed probes for library callers and tests
//! - Serde configuration that builds a boxed probe

pub mod config;
pub mod http;
pub mod tcp;

use async_trait::async_trait;
use reqbench_process::ReadinessCheck;
use thiserror::Error;

pub use config::ReadinessConfig;
pub use http::HttpReadiness;
pub use tcp::TcpReadiness;

/// Errors raised while building a probe from configuration.
#[derive(Error, Debug)]
pub enum ReadinessError {
    #[error("Invalid readiness endpoint: {endpoint} - {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid readiness address: {address}")]
    InvalidAddress { address: String },
}

/// Result type for probe construction.
pub type ReadinessResult<T> = Result<T, ReadinessError>;

/// Readiness check backed by a synchronous closure.
pub struct FnReadiness<F> {
    name: String,
    check: F,
}

impl<F> FnReadiness<F>
where
    F: Fn() -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

#[async_trait]
impl<F> ReadinessCheck for FnReadiness<F>
where
    F: Fn() -> bool + Send + Sync,
{
    async fn is_ready(&self) -> bool {
        (self.check)()
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
