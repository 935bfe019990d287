//! kb-mcp server binary.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use kb_mcp::server::{http, stdio};
use kb_mcp::{Config, McpServer, ToolRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// JSON-RPC over HTTP POST.
    Http,
    /// Newline-delimited JSON-RPC over stdin/stdout.
    Stdio,
}

#[derive(Debug, Parser)]
#[command(name = "kb-mcp", version, about = "MCP server for knowledge base, remote exec and n8n tools")]
struct Cli {
    /// Transport to serve MCP over.
    #[arg(long, env = "MCP_TRANSPORT", value_enum, default_value = "http")]
    transport: Transport,

    /// Bind host for the HTTP transport (overrides MCP_HTTP_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Bind port for the HTTP transport (overrides MCP_HTTP_PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kb_mcp=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!("Starting kb-mcp {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Qdrant: {}", config.qdrant.base_url());
    tracing::info!("Embeddings configured: {}", config.embeddings.api_key.is_some());
    tracing::info!("Exec API configured: {}", config.exec.api_key.is_some());
    tracing::info!("N8N configured: {}", config.workflow.api_key.is_some());

    let registry = Arc::new(ToolRegistry::with_builtin(&config));
    tracing::info!("Registered {} tools", registry.len());
    let server = McpServer::new(registry);

    match cli.transport {
        Transport::Stdio => stdio::serve(server).await.context("stdio transport failed")?,
        Transport::Http => http::serve(server, &config.server.host, config.server.port)
            .await
            .with_context(|| {
                format!(
                    "HTTP transport on {}:{} failed",
                    config.server.host, config.server.port
                )
            })?,
    }

    Ok(())
}
