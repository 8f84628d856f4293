use crate::runner::transport_manager::TransportVariant;
use mcp_bridge_core::{BridgeError, RunnerConfig};
use rmcp::model::{ClientCapabilities, ClientInfo, Implementation, InitializeRequestParam};
use rmcp::service::{Peer, RunningService};
use rmcp::{RoleClient, ServiceExt};
use tracing::{debug, error, info};

/// ServiceCoordinator owns the running protocol client for one session.
///
/// The handshake happens once, in [`ServiceCoordinator::new`]. Callers
/// issue requests through cloned [`Peer`] handles so that cancelling the
/// service never has to wait for an in-flight call.
pub struct ServiceCoordinator {
    service: RunningService<RoleClient, InitializeRequestParam>,
}

impl ServiceCoordinator {
    /// Performs the capability handshake over the given transport
    pub async fn new(
        transport: TransportVariant,
        config: &RunnerConfig,
    ) -> Result<Self, BridgeError> {
        let client_info = Self::create_client_info(config);

        let service = match transport {
            TransportVariant::Stdio(pipes) => client_info
                .serve((pipes.stdout, pipes.stdin))
                .await
                .map_err(|e| BridgeError::transport(format!("handshake failed: {e}")))?,
            TransportVariant::Sse(sse_transport) => client_info
                .serve(sse_transport)
                .await
                .map_err(|e| BridgeError::transport(format!("handshake failed: {e}")))?,
        };

        debug!("protocol handshake completed");
        Ok(Self { service })
    }

    fn create_client_info(config: &RunnerConfig) -> ClientInfo {
        ClientInfo {
            protocol_version: rmcp::model::ProtocolVersion::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: config.name.to_string(),
                version: config.version.to_string(),
            },
        }
    }

    /// A request handle for issuing RPC calls. Clones share the underlying
    /// connection; outstanding calls fail as soon as the service is
    /// cancelled.
    pub fn client(&self) -> Peer<RoleClient> {
        self.service.peer().clone()
    }

    /// Get server information recorded during the handshake
    pub fn peer_info(&self) -> Option<&rmcp::model::ServerInfo> {
        self.service.peer_info()
    }

    /// Cancel the service, failing any outstanding calls
    pub async fn cancel(self) {
        match self.service.cancel().await {
            Ok(_) => info!("protocol client closed"),
            Err(e) => error!(error = %e, "failed to close protocol client"),
        }
    }
}
