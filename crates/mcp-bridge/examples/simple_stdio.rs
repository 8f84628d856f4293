use mcp_bridge::{RunnerConfig, ServerRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Build the RunnerConfig with the desired settings.
    let config = RunnerConfig::builder()
        .name("simple-stdio") // Client name for the handshake
        .version("0.1.0") // Client version
        .command("npx") // Command to run
        .args(["-y", "@modelcontextprotocol/server-everything"]) // Arguments for the command
        .build()?;

    // Launch the server and perform the handshake.
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
