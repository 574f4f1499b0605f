//! Readiness probe configuration.

use crate::{HttpReadiness, ReadinessResult, TcpReadiness};
use reqbench_process::ReadinessCheck;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Readiness probe as written in a variant definition.
///
/// ```yaml
/// readiness:
///   type: http
///   endpoint: "http://127.0.0.1:5001/?input=1"
///   timeout: 1s
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReadinessConfig {
    Http {
        endpoint: String,
        #[serde(default = "default_http_timeout", with = "reqbench_common::duration_serde")]
        timeout: Duration,
    },
    Tcp {
        address: String,
        #[serde(default = "default_tcp_timeout", with = "reqbench_common::duration_serde")]
        timeout: Duration,
    },
}

impl ReadinessConfig {
    /// Build the probe. Fails on malformed endpoints or addresses, so this
    /// doubles as configuration validation.
    pub fn build(&self) -> ReadinessResult<Arc<dyn ReadinessCheck>> {
        match self {
            ReadinessConfig::Http { endpoint, timeout } => Ok(Arc::new(
                HttpReadiness::new(endpoint.clone())?.with_timeout(*timeout),
            )),
            ReadinessConfig::Tcp { address, timeout } => {
                Ok(Arc::new(TcpReadiness::parse(address)?.with_timeout(*timeout)))
            }
        }
    }
}

fn default_http_timeout() -> Duration {
    crate::http::DEFAULT_HTTP_TIMEOUT
}

fn default_tcp_timeout() -> Duration {
    crate::tcp::DEFAULT_CONNECT_TIMEOUT
}
