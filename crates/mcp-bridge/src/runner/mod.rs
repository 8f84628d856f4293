use crate::process::ServerProcess;
use crate::runner::service_coordinator::ServiceCoordinator;
use crate::runner::transport_manager::TransportManager;
use mcp_bridge_core::{BridgeError, RunnerConfig};
use rmcp::service::Peer;
use rmcp::RoleClient;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

pub mod service_coordinator;
pub mod transport_manager;

/// An unconnected runner: a configuration waiting to be launched.
pub struct ServerRunner {
    config: RunnerConfig,
}

impl ServerRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Launch the server process, build the transport, and perform the
    /// protocol handshake.
    ///
    /// On any step failure the already-launched process is terminated
    /// before the error is returned, so a failed connect leaves nothing
    /// behind.
    pub async fn connect(self) -> Result<ConnectedRunner, BridgeError> {
        info!(name = %self.config.name, command = %self.config.command, "connecting");
        self.config
            .validate()
            .map_err(|e| BridgeError::config(e.to_string()))?;

        let (transport, mut process) = TransportManager::new(&self.config).await?.into_parts();

        match ServiceCoordinator::new(transport, &self.config).await {
            Ok(coordinator) => Ok(ConnectedRunner {
                config: self.config,
                coordinator: RwLock::new(Some(coordinator)),
                process: Mutex::new(Some(process)),
            }),
            Err(e) => {
                process.terminate().await;
                Err(e)
            }
        }
    }
}

/// A live session: one launched process, one transport, one protocol
/// client, torn down together by [`ConnectedRunner::cancel`].
pub struct ConnectedRunner {
    config: RunnerConfig,
    coordinator: RwLock<Option<ServiceCoordinator>>,
    process: Mutex<Option<ServerProcess>>,
}

impl ConnectedRunner {
    /// Clone a request handle without holding any lock across the RPC
    async fn client(&self) -> Result<Peer<RoleClient>, BridgeError> {
        match &*self.coordinator.read().await {
            Some(coordinator) => Ok(coordinator.client()),
            None => Err(BridgeError::NotConnected),
        }
    }

    /// List available resources from the server
    pub async fn list_resources(
        &self,
    ) -> Result<rmcp::model::ListResourcesResult, BridgeError> {
        let client = self.client().await?;
        client
            .list_resources(Default::default())
            .await
            .map_err(convert_service_error)
    }

    /// List resource templates from the server
    pub async fn list_resource_templates(
        &self,
    ) -> Result<rmcp::model::ListResourceTemplatesResult, BridgeError> {
        let client = self.client().await?;
        client
            .list_resource_templates(Default::default())
            .await
            .map_err(convert_service_error)
    }

    /// Read a resource from the server
    pub async fn read_resource(
        &self,
        request: rmcp::model::ReadResourceRequestParam,
    ) -> Result<rmcp::model::ReadResourceResult, BridgeError> {
        let client = self.client().await?;
        client
            .read_resource(request)
            .await
            .map_err(convert_service_error)
    }

    /// List available prompts from the server
    pub async fn list_prompts(&self) -> Result<rmcp::model::ListPromptsResult, BridgeError> {
        let client = self.client().await?;
        client
            .list_prompts(Default::default())
            .await
            .map_err(convert_service_error)
    }

    /// Get a prompt from the server
    pub async fn get_prompt(
        &self,
        request: rmcp::model::GetPromptRequestParam,
    ) -> Result<rmcp::model::GetPromptResult, BridgeError> {
        let client = self.client().await?;
        client
            .get_prompt(request)
            .await
            .map_err(convert_service_error)
    }

    /// List available tools from the server
    pub async fn list_tools(&self) -> Result<rmcp::model::ListToolsResult, BridgeError> {
        let client = self.client().await?;
        client
            .list_tools(Default::default())
            .await
            .map_err(convert_service_error)
    }

    /// Call a tool on the server
    pub async fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
    ) -> Result<rmcp::model::CallToolResult, BridgeError> {
        let client = self.client().await?;
        client.call_tool(request).await.map_err(convert_service_error)
    }

    /// Server information recorded during the handshake, if still connected
    pub async fn peer_info(&self) -> Option<rmcp::model::ServerInfo> {
        self.coordinator
            .read()
            .await
            .as_ref()
            .and_then(|c| c.peer_info().cloned())
    }

    /// Process id of the launched server, if it is still owned and running
    pub async fn process_id(&self) -> Option<u32> {
        self.process.lock().await.as_ref().and_then(ServerProcess::id)
    }

    /// Tear down the session: close the protocol client, then terminate the
    /// server process. Tolerates an already-degraded connection; calling it
    /// twice is a no-op.
    pub async fn cancel(&self) {
        info!(name = %self.config.name, "closing session");

        if let Some(coordinator) = self.coordinator.write().await.take() {
            coordinator.cancel().await;
        } else {
            warn!(name = %self.config.name, "session already closed");
        }

        if let Some(mut process) = self.process.lock().await.take() {
            process.terminate().await;
        }
    }
}

/// Map a protocol library failure onto the bridge taxonomy. Application
/// errors reported by the server keep their JSON-RPC code and data.
fn convert_service_error(err: rmcp::ServiceError) -> BridgeError {
    match err {
        rmcp::ServiceError::McpError(e) => BridgeError::Protocol {
            message: e.message.to_string(),
            code: Some(i64::from(e.code.0)),
            data: e.data,
        },
        other => BridgeError::transport(other.to_string()),
    }
}
