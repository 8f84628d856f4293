use mcp_bridge::{RunnerConfig, ServerRunner, Transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    const PORT: u16 = 8000;
    // Build the RunnerConfig with the desired settings.
    let config = RunnerConfig::builder()
        .name("simple-sse") // Client name for the handshake
        .version("0.1.0") // Client version
        .command("uvx") // Command to run
        .args(["mcp-server-fetch", "--transport", "sse"]) // Arguments for the command
        .env("PORT", PORT.to_string().as_str()) // Port the server should bind
        .transport(Transport::Sse {
            url: format!("http://127.0.0.1:{PORT}/sse"),
        })
        .build()?;

    // Launch the server, wait for it to answer on its URL, and connect.
    let runner = ServerRunner::new(config).connect().await?;

    // List available tools.
    let tools = runner.list_tools().await?;

    // Print the name of each tool.
    tools.tools.into_iter().for_each(|tool| {
        println!("{}", tool.name);
    });

    runner.cancel().await;
    Ok(())
}
