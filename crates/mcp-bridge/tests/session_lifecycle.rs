use mcp_bridge::{RunnerConfig, SessionRegistry};
use rmcp::model::CallToolRequestParam;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const TEST_SERVER: &str = env!("CARGO_BIN_EXE_test_server");

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_file(true)
        .with_thread_ids(false)
        .with_target(false)
        .with_line_number(true)
        .try_init();
}

fn server_config() -> RunnerConfig {
    RunnerConfig::builder()
        .name("lifecycle-test")
        .version("0.1.0")
        .command(TEST_SERVER)
        .build()
        .unwrap()
}

fn text_of(result: &rmcp::model::CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect()
}

#[tokio::test]
async fn test_session_lifecycle_happy_path() {
    init_tracing();
    let registry = SessionRegistry::new();

    registry.connect("s1", server_config()).await.unwrap();
    assert!(registry.contains("s1"));

    let client = registry.get("s1").unwrap();
    assert!(client.peer_info().await.is_some());

    let tools = client.list_tools().await.unwrap();
    assert!(tools.tools.iter().any(|t| t.name == "add"));

    let result = client
        .call_tool(CallToolRequestParam {
            name: "add".into(),
            arguments: serde_json::json!({"a": 5, "b": 3}).as_object().cloned(),
        })
        .await
        .unwrap();
    assert_eq!(text_of(&result), "8");

    registry.disconnect("s1").await.unwrap();
    let err = registry.get("s1").err().expect("session must be gone");
    assert_eq!(err.kind(), "SessionNotFoundError");
}

#[tokio::test]
async fn test_reconnect_replaces_previous_session() {
    init_tracing();
    let registry = SessionRegistry::new();

    registry.connect("dup", server_config()).await.unwrap();
    let first = registry.get("dup").unwrap();
    assert!(first.process_id().await.is_some());

    registry.connect("dup", server_config()).await.unwrap();
    assert_eq!(registry.len(), 1);

    // The first session's process and client were torn down with it.
    assert!(first.process_id().await.is_none());
    let err = first
        .list_tools()
        .await
        .err()
        .expect("old client must be dead");
    assert_eq!(err.kind(), "NotConnectedError");

    // The replacement session is live.
    let second = registry.get("dup").unwrap();
    assert!(second.list_tools().await.is_ok());

    registry.disconnect("dup").await.unwrap();
}

#[tokio::test]
async fn test_concurrent_connects_leave_one_session() {
    init_tracing();
    let registry = Arc::new(SessionRegistry::new());

    let (a, b) = tokio::join!(
        registry.connect("race", server_config()),
        registry.connect("race", server_config()),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.get("race").unwrap().list_tools().await.is_ok());

    registry.disconnect("race").await.unwrap();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_server_exit_fails_calls_instead_of_hanging() {
    init_tracing();
    let registry = SessionRegistry::new();

    registry.connect("crashy", server_config()).await.unwrap();
    let client = registry.get("crashy").unwrap();

    // The reply may or may not make it out before the process dies.
    let _ = timeout(
        Duration::from_secs(10),
        client.call_tool(CallToolRequestParam {
            name: "crash".into(),
            arguments: None,
        }),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let outcome = timeout(Duration::from_secs(10), client.list_tools())
        .await
        .expect("call on a dead server must fail fast, not hang");
    let err = outcome.err().expect("call on a dead server must fail");
    assert!(
        matches!(err.kind(), "TransportError" | "NotConnectedError"),
        "unexpected error kind: {}",
        err.kind()
    );

    // Disconnect still removes the entry for a degraded session.
    registry.disconnect("crashy").await.unwrap();
    assert!(!registry.contains("crashy"));
}

#[tokio::test]
async fn test_spawn_failure_leaves_no_session() {
    init_tracing();
    let registry = SessionRegistry::new();

    let config = RunnerConfig::builder()
        .name("lifecycle-test")
        .version("0.1.0")
        .command("definitely-not-a-real-binary")
        .build()
        .unwrap();

    let err = registry
        .connect("ghost", config)
        .await
        .err()
        .expect("connect must fail");
    assert_eq!(err.kind(), "SpawnError");
    assert!(!registry.contains("ghost"));
}

#[tokio::test]
async fn test_call_without_connect_fails_fast() {
    init_tracing();
    let registry = SessionRegistry::new();

    let outcome = timeout(Duration::from_secs(5), async { registry.get("never") })
        .await
        .expect("lookup must not hang");
    assert_eq!(
        outcome.err().expect("lookup must fail").kind(),
        "SessionNotFoundError"
    );
}
