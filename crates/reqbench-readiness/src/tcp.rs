// TCP readiness probe

use crate::{ReadinessError, ReadinessResult};
use async_trait::async_trait;
use reqbench_process::ReadinessCheck;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Considers a server ready once it accepts a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpReadiness {
    address: SocketAddr,
    connect_timeout: Duration,
}

impl TcpReadiness {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Parse `host:port` with a literal IP address.
    pub fn parse(address: &str) -> ReadinessResult<Self> {
        address
            .parse::<SocketAddr>()
            .map(Self::new)
            .map_err(|_| ReadinessError::InvalidAddress {
                address: address.to_string(),
            })
    }

    pub fn with_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

#[async_trait]
impl ReadinessCheck for TcpReadiness {
    async fn is_ready(&self) -> bool {
        match timeout(self.connect_timeout, TcpStream::connect(self.address)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!("TCP readiness probe {} refused: {}", self.address, e);
                false
            }
            Err(_) => {
                debug!("TCP readiness probe {} timed out", self.address);
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("tcp connect {}", self.address)
    }
}
