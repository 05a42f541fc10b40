//! Single-shot TCP reachability probe.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use jarstarter_core::{Liveness, LivenessOracle};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Why a probe found the port closed. Only ever logged.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection refused")]
    Refused,

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("connect failed: {0}")]
    Other(#[source] io::Error),
}

/// Try to open a TCP connection to `host:port` within `limit`.
///
/// The connection is closed immediately on success.
pub async fn probe_port(host: &str, port: u16, limit: Duration) -> Result<(), ProbeError> {
    match timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Ok(())
        }
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => Err(ProbeError::Refused),
        Ok(Err(e)) => Err(ProbeError::Other(e)),
        Err(_) => Err(ProbeError::Timeout(limit)),
    }
}

/// Oracle answering "alive" while the service port accepts connections.
#[derive(Debug, Clone)]
pub struct PortProbeOracle {
    host: String,
    port: u16,
    timeout: Duration,
}

impl PortProbeOracle {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl LivenessOracle for PortProbeOracle {
    fn name(&self) -> &'static str {
        "port"
    }

    async fn observe(&self) -> Liveness {
        match probe_port(&self.host, self.port, self.timeout).await {
            Ok(()) => Liveness::Alive,
            Err(e) => {
                debug!(host = %self.host, port = self.port, error = %e, "Port probe failed");
                Liveness::Dead
            }
        }
    }
}
