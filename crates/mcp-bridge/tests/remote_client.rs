use mcp_bridge::bridge;
use mcp_bridge::{ProtocolClient, RemoteClient, SessionRegistry};
use rmcp::model::{CallToolRequestParam, ReadResourceRequestParam};
use std::sync::Arc;

const TEST_SERVER: &str = env!("CARGO_BIN_EXE_test_server");

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .try_init();
}

/// Serve the bridge on an ephemeral port and return its endpoint URL.
async fn start_bridge() -> (String, Arc<SessionRegistry>) {
    let registry = Arc::new(SessionRegistry::new());
    let app = bridge::router(registry.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("bridge server error: {e}");
        }
    });

    (format!("http://{addr}{}", bridge::BRIDGE_PATH), registry)
}

#[tokio::test]
async fn test_remote_client_round_trip() {
    init_tracing();
    let (endpoint, registry) = start_bridge().await;

    let client = RemoteClient::connect(&endpoint, "r1", TEST_SERVER, None)
        .await
        .unwrap();
    assert_eq!(client.session_id(), "r1");
    assert!(registry.contains("r1"));

    let tools = client.list_tools().await.unwrap();
    assert!(tools.tools.iter().any(|t| t.name == "add"));

    let result = client
        .call_tool(CallToolRequestParam {
            name: "add".into(),
            arguments: serde_json::json!({"a": 5, "b": 3}).as_object().cloned(),
        })
        .await
        .unwrap();
    let text: String = result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect();
    assert_eq!(text, "8");

    let resource = client
        .read_resource(ReadResourceRequestParam {
            uri: "greeting://World".to_string(),
        })
        .await
        .unwrap();
    assert!(!resource.contents.is_empty());

    client.close().await.unwrap();
    assert!(!registry.contains("r1"));

    // The session is gone on the bridge side as well.
    let err = client.list_tools().await.err().expect("session must be gone");
    assert_eq!(err.kind(), "SessionNotFoundError");
}

#[tokio::test]
async fn test_remote_and_local_clients_share_one_interface() {
    init_tracing();
    let (endpoint, registry) = start_bridge().await;

    // A bridge-backed session and a direct in-process session, behind the
    // same capability surface.
    let remote = RemoteClient::connect(&endpoint, "iface", TEST_SERVER, None)
        .await
        .unwrap();
    registry
        .connect(
            "direct",
            mcp_bridge::RunnerConfig::builder()
                .name("iface-test")
                .version("0.1.0")
                .command(TEST_SERVER)
                .build()
                .unwrap(),
        )
        .await
        .unwrap();
    let direct = registry.get("direct").unwrap();

    let clients: Vec<&dyn ProtocolClient> = vec![&remote, direct.as_ref()];
    for client in clients {
        let tools = client.list_tools().await.unwrap();
        assert!(tools.tools.iter().any(|t| t.name == "add"));
    }

    remote.close().await.unwrap();
    registry.disconnect("direct").await.unwrap();
}

#[tokio::test]
async fn test_remote_connect_spawn_failure() {
    init_tracing();
    let (endpoint, registry) = start_bridge().await;

    let err = RemoteClient::connect(&endpoint, "ghost", "definitely-not-a-real-binary", None)
        .await
        .err()
        .expect("connect must fail");
    assert_eq!(err.kind(), "SpawnError");
    assert!(!registry.contains("ghost"));
}
