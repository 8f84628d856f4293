use crate::process::{ServerProcess, StdioPipes};
use backon::{ExponentialBuilder, Retryable};
use mcp_bridge_core::{BridgeError, RunnerConfig, Transport};
use rmcp::transport::SseClientTransport;
use std::time::Duration;
use tracing::{debug, info};

/// TransportManager launches the server process and builds the transport
/// that will carry protocol messages to it.
pub struct TransportManager {
    transport: TransportVariant,
    process: ServerProcess,
}

pub enum TransportVariant {
    Stdio(StdioPipes),
    Sse(SseClientTransport<reqwest::Client>),
}

impl TransportManager {
    pub async fn new(config: &RunnerConfig) -> Result<Self, BridgeError> {
        match &config.transport {
            Transport::Stdio => {
                debug!(command = %config.command, "creating stdio transport");
                let (process, pipes) = ServerProcess::spawn_stdio(config)?;
                Ok(Self {
                    transport: TransportVariant::Stdio(pipes),
                    process,
                })
            }
            Transport::Sse { url } => {
                info!(url = %url, "creating SSE transport");
                let mut process = ServerProcess::spawn(config)?;
                match Self::create_sse_transport(url).await {
                    Ok(transport) => Ok(Self {
                        transport: TransportVariant::Sse(transport),
                        process,
                    }),
                    Err(e) => {
                        // The server process must not outlive a failed connect.
                        process.terminate().await;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Creates an SSE transport once the server starts answering on its URL
    async fn create_sse_transport(
        url: &str,
    ) -> Result<SseClientTransport<reqwest::Client>, BridgeError> {
        Self::poll_server_readiness(url, 10, 250).await?;

        SseClientTransport::start(url.to_string())
            .await
            .map_err(|e| BridgeError::transport(format!("failed to open SSE stream: {e}")))
    }

    /// Poll the server until its event-stream endpoint accepts a connection
    async fn poll_server_readiness(
        url: &str,
        max_attempts: usize,
        interval_ms: u64,
    ) -> Result<(), BridgeError> {
        debug!(
            url = %url,
            max_attempts,
            interval_ms,
            "polling server readiness"
        );

        let poll = ExponentialBuilder::new()
            .with_jitter()
            .with_min_delay(Duration::from_millis(interval_ms))
            .with_max_delay(Duration::from_secs(1))
            .with_max_times(max_attempts);

        (|| async {
            SseClientTransport::start(url.to_string())
                .await
                .map(drop)
                .map_err(|e| BridgeError::transport(format!("server not ready: {e}")))
        })
        .retry(poll)
        .await
    }

    /// Consumes the manager, handing the transport and the launched process
    /// to the caller
    pub fn into_parts(self) -> (TransportVariant, ServerProcess) {
        (self.transport, self.process)
    }
}
