//! Spawns an MCP server as a child process, performs the `initialize`
//! handshake, and lists the tools it advertises.
//!
//! ```text
//! cargo run --example stdio-client -- npx -y @modelcontextprotocol/server-everything
//! ```

use std::env;

use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use mcp_client::{Endpoint, EndpointConfig, StdioTransport};
use mcp_client::transport::stdio::StdioConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("setting default subscriber failed: {e}"))?;

    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("usage: stdio-client <command> [args...]");
        std::process::exit(2);
    };

    let mut config = StdioConfig::new(&command);
    for arg in args {
        config = config.arg(arg);
    }

    info!("spawning MCP server: {command}");
    let transport = StdioTransport::new(config);
    let endpoint = Endpoint::new(transport, EndpointConfig::default()).await?;

    println!("=== stdio MCP client demo ===\n");

    println!("1. connecting and negotiating capabilities...");
    let capabilities = match endpoint.connect().await {
        Ok(capabilities) => {
            println!("   connected");
            capabilities
        }
        Err(err) => {
            error!("connect failed: {err}");
            return Err(err.into());
        }
    };

    if capabilities.tools.is_none() {
        println!("\nserver does not advertise a tools capability, nothing more to do");
        endpoint.disconnect().await?;
        return Ok(());
    }

    println!("\n2. listing tools...");
    let tools = endpoint.list_tools().await?;
    if tools.is_empty() {
        println!("   server advertised no tools");
    }
    for tool in &tools {
        match &tool.description {
            Some(description) => println!("   - {} — {description}", tool.name),
            None => println!("   - {}", tool.name),
        }
    }

    if let Some(tool) = tools.first() {
        println!("\n3. calling '{}' with empty arguments...", tool.name);
        match endpoint.call_tool(tool.name.clone(), None).await {
            Ok(content) => {
                for item in content {
                    if let Some(text) = item.as_text() {
                        println!("   {text}");
                    }
                }
            }
            Err(err) => error!("tool call failed: {err}"),
        }
    }

    endpoint.disconnect().await?;
    println!("\n=== demo complete ===");
    Ok(())
}
