//! Gmail MCP server
//!
//! A Model Context Protocol (MCP) server for Gmail. Credentials are
//! resolved per tool call (override map or environment), so startup only
//! selects the transport and runs the stdio loop.

use clap::Parser;

use gmail_mcp::config::Transport;
use gmail_mcp::error::Result;
use gmail_mcp::mcp::server::McpServer;

/// Gmail MCP server
#[derive(Parser)]
#[command(name = "gmail-mcp")]
#[command(author, version, about = "Provides tools for common operations with Gmail (e.g., send_mail)")]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is the MCP channel
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let _cli = Cli::parse();

    // Fails fast when TRANSPORT selects anything other than stdio
    let _transport: Transport = Transport::from_env()?;

    let mut server = McpServer::new();
    server.run_stdio().await?;

    Ok(())
}
