use mcp_bridge::bridge;
use mcp_bridge::registry::SessionRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = bind_address()?;
    let registry = Arc::new(SessionRegistry::new());
    let app = bridge::router(registry.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, path = bridge::BRIDGE_PATH, "bridge listening");

    let ct = CancellationToken::new();
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let ct = ct.clone();
        async move {
            ct.cancelled().await;
            tracing::info!("bridge shutting down");
        }
    });

    let server_task = tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!(error = %e, "server shutdown with error");
        }
    });

    tokio::signal::ctrl_c().await?;
    ct.cancel();
    let _ = server_task.await;

    // Sessions whose callers never sent a disconnect are torn down here so
    // no server process outlives the bridge.
    registry.shutdown().await;

    Ok(())
}

fn bind_address() -> anyhow::Result<SocketAddr> {
    let addr = match std::env::var("BIND") {
        Ok(bind) => bind,
        Err(_) => match std::env::var("PORT") {
            Ok(port) => format!("127.0.0.1:{port}"),
            Err(_) => "127.0.0.1:3000".to_string(),
        },
    };

    Ok(addr.parse()?)
}
