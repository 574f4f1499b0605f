// HTTP readiness probe

use crate::{ReadinessError, ReadinessResult};
use async_trait::async_trait;
use http_body_util::Empty;
use hyper::body::Bytes;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use reqbench_process::ReadinessCheck;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Default per-request timeout for HTTP probes.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(1);

/// Considers a server ready as soon as it answers an HTTP GET with any
/// status. Only connection failures and timeouts count as "not ready".
pub struct HttpReadiness {
    endpoint: String,
    uri: Uri,
    request_timeout: Duration,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl HttpReadiness {
    pub fn new(endpoint: impl Into<String>) -> ReadinessResult<Self> {
        let endpoint = endpoint.into();
        let uri = endpoint
            .parse::<Uri>()
            .map_err(|e| ReadinessError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        if uri.scheme_str() != Some("http") || uri.host().is_none() {
            return Err(ReadinessError::InvalidEndpoint {
                endpoint,
                reason: "expected an absolute http:// URL".to_string(),
            });
        }

        // No idle connections: the probe must not keep sockets open against
        // the server being benchmarked.
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build_http();

        Ok(Self {
            endpoint,
            uri,
            request_timeout: DEFAULT_HTTP_TIMEOUT,
            client,
        })
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReadinessCheck for HttpReadiness {
    async fn is_ready(&self) -> bool {
        let request = match Request::builder()
            .method(Method::GET)
            .uri(self.uri.clone())
            .header("User-Agent", "reqbench/1.0")
            .body(Empty::<Bytes>::new())
        {
            Ok(request) => request,
            Err(e) => {
                debug!("Failed to build readiness request for {}: {}", self.endpoint, e);
                return false;
            }
        };

        match timeout(self.request_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                debug!("Readiness probe {} answered {}", self.endpoint, response.status());
                true
            }
            Ok(Err(e)) => {
                debug!("Readiness probe {} not answering: {}", self.endpoint, e);
                false
            }
            Err(_) => {
                debug!("Readiness probe {} timed out", self.endpoint);
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("http GET {}", self.endpoint)
    }
}
