use crate::registry::SessionRegistry;
use crate::runner::ConnectedRunner;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use mcp_bridge_core::{BridgeError, RunnerConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Single POST route carrying every bridge operation.
pub const BRIDGE_PATH: &str = "/api/mcp";

/// One request against the bridge: an action, a session identifier, and
/// the action's own fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub action: String,
    pub session_id: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// The uniform response envelope. Every outcome, including malformed
/// requests, is reported through this shape.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl BridgeResponse {
    fn ok(message: impl ToString) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            result: None,
            error: None,
            code: None,
            data: None,
        }
    }

    fn ok_result(result: Value) -> Self {
        Self {
            success: true,
            message: None,
            result: Some(result),
            error: None,
            code: None,
            data: None,
        }
    }

    fn failure(error: &BridgeError) -> Self {
        let data = match error {
            BridgeError::Protocol { code, data, .. } => {
                let mut detail = serde_json::Map::new();
                if let Some(code) = code {
                    detail.insert("code".to_string(), Value::from(*code));
                }
                if let Some(data) = data {
                    detail.insert("data".to_string(), data.clone());
                }
                if detail.is_empty() {
                    None
                } else {
                    Some(Value::Object(detail))
                }
            }
            _ => None,
        };

        Self {
            success: false,
            message: None,
            result: None,
            error: Some(error.to_string()),
            code: Some(error.kind().to_string()),
            data,
        }
    }
}

pub fn router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route(BRIDGE_PATH, post(handle_bridge_request))
        .with_state(registry)
}

/// The stateless dispatcher. Failures never escape this boundary; every
/// error becomes a response envelope with a matching status code.
async fn handle_bridge_request(
    State(registry): State<Arc<SessionRegistry>>,
    body: Bytes,
) -> (StatusCode, Json<BridgeResponse>) {
    let request: BridgeRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "malformed bridge request");
            let error = BridgeError::invalid_params("request", e.to_string());
            return (StatusCode::BAD_REQUEST, Json(BridgeResponse::failure(&error)));
        }
    };

    debug!(
        action = %request.action,
        session_id = %request.session_id,
        method = request.method.as_deref().unwrap_or(""),
        "bridge request"
    );

    match dispatch(&registry, request).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => (status_for(&e), Json(BridgeResponse::failure(&e))),
    }
}

async fn dispatch(
    registry: &SessionRegistry,
    request: BridgeRequest,
) -> Result<BridgeResponse, BridgeError> {
    match request.action.as_str() {
        "connect" => {
            let config =
                runner_config_from(request.command.as_deref(), request.args.as_deref())?;
            registry.connect(&request.session_id, config).await?;
            Ok(BridgeResponse::ok("Connected successfully"))
        }
        "disconnect" => {
            registry.disconnect(&request.session_id).await?;
            Ok(BridgeResponse::ok("Disconnected successfully"))
        }
        "call" => {
            let client = registry.get(&request.session_id)?;
            let method = request.method.as_deref().unwrap_or_default();
            let result = call_method(&client, method, request.params).await?;
            Ok(BridgeResponse::ok_result(result))
        }
        other => Err(BridgeError::UnknownAction(other.to_string())),
    }
}

/// Forward one named RPC method to the session's client. Unknown names are
/// rejected here, before anything reaches the server process.
async fn call_method(
    client: &ConnectedRunner,
    method: &str,
    params: Option<Value>,
) -> Result<Value, BridgeError> {
    match method {
        "listResources" => encode(client.list_resources().await?),
        "listResourceTemplates" => encode(client.list_resource_templates().await?),
        "readResource" => {
            encode(client.read_resource(parse_params(method, params)?).await?)
        }
        "listPrompts" => encode(client.list_prompts().await?),
        "getPrompt" => encode(client.get_prompt(parse_params(method, params)?).await?),
        "listTools" => encode(client.list_tools().await?),
        "callTool" => encode(client.call_tool(parse_params(method, params)?).await?),
        other => Err(BridgeError::UnknownMethod(other.to_string())),
    }
}

fn parse_params<T: DeserializeOwned>(
    method: &str,
    params: Option<Value>,
) -> Result<T, BridgeError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| BridgeError::invalid_params(method, e))
}

fn encode<T: Serialize>(value: T) -> Result<Value, BridgeError> {
    serde_json::to_value(value)
        .map_err(|e| BridgeError::transport(format!("failed to encode result: {e}")))
}

/// Build a runner configuration from the request's command string.
///
/// The executable is the first whitespace-separated token of `command`;
/// its remaining tokens and the tokens of `args` form the argument vector.
fn runner_config_from(
    command: Option<&str>,
    args: Option<&str>,
) -> Result<RunnerConfig, BridgeError> {
    let mut parts = command
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string);
    let executable = parts
        .next()
        .ok_or_else(|| BridgeError::invalid_params("connect", "missing command"))?;

    let mut argv: Vec<String> = parts.collect();
    if let Some(args) = args {
        argv.extend(args.split_whitespace().map(str::to_string));
    }

    RunnerConfig::builder()
        .name(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .command(executable)
        .args(argv)
        .build()
        .map_err(|e| BridgeError::config(e.to_string()))
}

fn status_for(error: &BridgeError) -> StatusCode {
    if error.is_request_error() {
        StatusCode::BAD_REQUEST
    } else if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
