use crate::bridge::BridgeResponse;
use crate::runner::ConnectedRunner;
use async_trait::async_trait;
use mcp_bridge_core::BridgeError;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
    ReadResourceRequestParam, ReadResourceResult,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

/// Capability surface of one server session.
///
/// Both ways of reaching a session satisfy it: [`ConnectedRunner`] drives
/// the protocol client in-process, [`RemoteClient`] proxies every call
/// through a bridge endpoint.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    async fn list_resources(&self) -> Result<ListResourcesResult, BridgeError>;
    async fn list_resource_templates(&self) -> Result<ListResourceTemplatesResult, BridgeError>;
    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> Result<ReadResourceResult, BridgeError>;
    async fn list_prompts(&self) -> Result<ListPromptsResult, BridgeError>;
    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
    ) -> Result<GetPromptResult, BridgeError>;
    async fn list_tools(&self) -> Result<ListToolsResult, BridgeError>;
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, BridgeError>;
    async fn close(&self) -> Result<(), BridgeError>;
}

#[async_trait]
impl ProtocolClient for ConnectedRunner {
    async fn list_resources(&self) -> Result<ListResourcesResult, BridgeError> {
        ConnectedRunner::list_resources(self).await
    }

    async fn list_resource_templates(&self) -> Result<ListResourceTemplatesResult, BridgeError> {
        ConnectedRunner::list_resource_templates(self).await
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> Result<ReadResourceResult, BridgeError> {
        ConnectedRunner::read_resource(self, request).await
    }

    async fn list_prompts(&self) -> Result<ListPromptsResult, BridgeError> {
        ConnectedRunner::list_prompts(self).await
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
    ) -> Result<GetPromptResult, BridgeError> {
        ConnectedRunner::get_prompt(self, request).await
    }

    async fn list_tools(&self) -> Result<ListToolsResult, BridgeError> {
        ConnectedRunner::list_tools(self).await
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, BridgeError> {
        ConnectedRunner::call_tool(self, request).await
    }

    async fn close(&self) -> Result<(), BridgeError> {
        self.cancel().await;
        Ok(())
    }
}

/// A session client backed by a remote bridge endpoint.
///
/// Every operation becomes one `{action, sessionId, ...}` request against
/// the endpoint; failure envelopes are mapped back onto [`BridgeError`].
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: String,
    session_id: String,
}

impl RemoteClient {
    pub fn new(endpoint: impl ToString, session_id: impl ToString) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            session_id: session_id.to_string(),
        }
    }

    /// Ask the bridge to create the session, replacing any session the
    /// bridge already holds under this identifier.
    pub async fn connect(
        endpoint: impl ToString,
        session_id: impl ToString,
        command: &str,
        args: Option<&str>,
    ) -> Result<Self, BridgeError> {
        let client = Self::new(endpoint, session_id);
        client
            .post(json!({
                "action": "connect",
                "sessionId": client.session_id,
                "command": command,
                "args": args,
            }))
            .await?;
        Ok(client)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn call_remote<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, BridgeError> {
        let result = self
            .post(json!({
                "action": "call",
                "sessionId": self.session_id,
                "method": method,
                "params": params,
            }))
            .await?
            .result
            .unwrap_or(Value::Null);

        serde_json::from_value(result)
            .map_err(|e| BridgeError::transport(format!("malformed {method} result: {e}")))
    }

    async fn post(&self, body: Value) -> Result<BridgeResponse, BridgeError> {
        debug!(endpoint = %self.endpoint, "bridge request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::transport(format!("bridge unreachable: {e}")))?;

        let envelope: BridgeResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::transport(format!("malformed bridge response: {e}")))?;

        if envelope.success {
            Ok(envelope)
        } else {
            Err(decode_failure(&envelope, &self.session_id))
        }
    }
}

/// Rebuild the error kind a failure envelope was produced from.
fn decode_failure(envelope: &BridgeResponse, session_id: &str) -> BridgeError {
    let message = envelope.error.clone().unwrap_or_else(|| "unknown error".to_string());
    match envelope.code.as_deref() {
        Some("SpawnError") => BridgeError::Spawn(message),
        Some("NotConnectedError") => BridgeError::NotConnected,
        Some("SessionNotFoundError") => BridgeError::session_not_found(session_id),
        Some("UnknownMethodError") => BridgeError::UnknownMethod(message),
        Some("UnknownActionError") => BridgeError::UnknownAction(message),
        Some("InvalidParamsError") => BridgeError::invalid_params("request", message),
        Some("ProtocolError") => BridgeError::Protocol {
            message,
            code: envelope
                .data
                .as_ref()
                .and_then(|d| d.get("code"))
                .and_then(Value::as_i64),
            data: envelope
                .data
                .as_ref()
                .and_then(|d| d.get("data"))
                .cloned(),
        },
        Some("ConfigError") => BridgeError::config(message),
        _ => BridgeError::transport(message),
    }
}

#[async_trait]
impl ProtocolClient for RemoteClient {
    async fn list_resources(&self) -> Result<ListResourcesResult, BridgeError> {
        self.call_remote("listResources", None).await
    }

    async fn list_resource_templates(&self) -> Result<ListResourceTemplatesResult, BridgeError> {
        self.call_remote("listResourceTemplates", None).await
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> Result<ReadResourceResult, BridgeError> {
        self.call_remote("readResource", Some(encode_params("readResource", request)?))
            .await
    }

    async fn list_prompts(&self) -> Result<ListPromptsResult, BridgeError> {
        self.call_remote("listPrompts", None).await
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
    ) -> Result<GetPromptResult, BridgeError> {
        self.call_remote("getPrompt", Some(encode_params("getPrompt", request)?))
            .await
    }

    async fn list_tools(&self) -> Result<ListToolsResult, BridgeError> {
        self.call_remote("listTools", None).await
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, BridgeError> {
        self.call_remote("callTool", Some(encode_params("callTool", request)?))
            .await
    }

    async fn close(&self) -> Result<(), BridgeError> {
        self.post(json!({
            "action": "disconnect",
            "sessionId": self.session_id,
        }))
        .await
        .map(|_| ())
    }
}

fn encode_params<T: serde::Serialize>(method: &str, params: T) -> Result<Value, BridgeError> {
    serde_json::to_value(params)
        .map_err(|e| BridgeError::invalid_params(method, e))
}
