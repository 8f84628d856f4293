//! Minimal stdio MCP server used by the integration tests.
//!
//! Exposes an `add` tool, a `greet` prompt, and a `greeting://` resource,
//! plus a `crash` tool that exits the process shortly after replying.

use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::transport::stdio;
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone, Default)]
struct TestServer;

impl ServerHandler for TestServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "test-server".to_string(),
                version: "1.0.0".to_string(),
            },
            instructions: None,
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let add_schema: JsonObject = serde_json::from_value(serde_json::json!({
            "type": "object",
            "properties": {
                "a": {"type": "number"},
                "b": {"type": "number"}
            },
            "required": ["a", "b"]
        }))
        .expect("static schema");

        let crash_schema: JsonObject = serde_json::from_value(serde_json::json!({
            "type": "object",
            "properties": {}
        }))
        .expect("static schema");

        Ok(ListToolsResult {
            tools: vec![
                Tool::new("add", "Add two numbers", Arc::new(add_schema)),
                Tool::new(
                    "crash",
                    "Exit the process shortly after replying",
                    Arc::new(crash_schema),
                ),
            ],
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        match request.name.as_ref() {
            "add" => {
                let args = request.arguments.unwrap_or_default();
                let a = number_arg(&args, "a")?;
                let b = number_arg(&args, "b")?;
                let sum = a + b;
                let text = if sum.fract() == 0.0 {
                    format!("{}", sum as i64)
                } else {
                    sum.to_string()
                };
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            "crash" => {
                tokio::spawn(async {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    std::process::exit(1);
                });
                Ok(CallToolResult::success(vec![Content::text("crashing")]))
            }
            other => Err(ErrorData::invalid_params(
                format!("unknown tool: {other}"),
                None,
            )),
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, ErrorData> {
        Ok(ListPromptsResult {
            prompts: vec![Prompt::new(
                "greet",
                Some("A simple greeting prompt"),
                Some(vec![PromptArgument {
                    name: "name".to_string(),
                    description: Some("The name to greet".to_string()),
                    required: Some(true),
                }]),
            )],
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, ErrorData> {
        if request.name != "greet" {
            return Err(ErrorData::invalid_params(
                format!("unknown prompt: {}", request.name),
                None,
            ));
        }

        let name = request
            .arguments
            .as_ref()
            .and_then(|args| args.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("stranger")
            .to_string();

        Ok(GetPromptResult {
            description: Some("A simple greeting prompt".to_string()),
            messages: vec![PromptMessage::new_text(
                PromptMessageRole::User,
                format!("Hello, {name}! How are you today?"),
            )],
        })
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult {
            resources: vec![RawResource::new("greeting://world", "greeting").no_annotation()],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        match request.uri.strip_prefix("greeting://") {
            Some(name) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(
                    format!("Hello, {name}!"),
                    request.uri.clone(),
                )],
            }),
            None => Err(ErrorData::invalid_params(
                format!("unknown resource: {}", request.uri),
                None,
            )),
        }
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        Ok(ListResourceTemplatesResult {
            resource_templates: vec![],
            next_cursor: None,
        })
    }
}

fn number_arg(args: &JsonObject, key: &str) -> Result<f64, ErrorData> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ErrorData::invalid_params(format!("missing number argument: {key}"), None))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let service = TestServer.serve(stdio()).await.inspect_err(|e| {
        eprintln!("serving error: {e:?}");
    })?;

    service.waiting().await?;
    Ok(())
}
