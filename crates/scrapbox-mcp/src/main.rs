//! Scrapbox MCP server binary.
//!
//! Serves MCP over stdio. Logs go to stderr.
//!
//! Usage:
//!   COSENSE_PROJECT_NAME=myproject COSENSE_SID=s%3A... cargo run -p scrapbox-mcp
//!
//! Test with MCP inspector:
//!   npx @modelcontextprotocol/inspector cargo run -p scrapbox-mcp

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::{EnvFilter, fmt};

use scrapbox_client::constants::{DEFAULT_API_URL, DEFAULT_WS_URL, REQUEST_TIMEOUT};
use scrapbox_client::{ClientConfig, ScrapboxClient};
use scrapbox_mcp::ScrapboxMcp;

/// MCP server for Scrapbox pages.
#[derive(Parser)]
#[command(name = "scrapbox-mcp")]
#[command(about = "MCP server for reading and editing Scrapbox pages")]
struct Args {
    /// Default project for tools called without one
    #[arg(long, env = "COSENSE_PROJECT_NAME")]
    project: String,

    /// Session cookie value (connect.sid)
    #[arg(long, env = "COSENSE_SID", hide_env_values = true)]
    sid: String,

    /// REST API root
    #[arg(long, env = "SCRAPBOX_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Socket endpoint
    #[arg(long, env = "SCRAPBOX_WS_URL", default_value = DEFAULT_WS_URL)]
    ws_url: String,

    /// REST request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = REQUEST_TIMEOUT.as_secs())]
    request_timeout: u64,
}

impl Args {
    fn client_config(self) -> ClientConfig {
        let session_id = Some(self.sid).filter(|s| !s.is_empty());
        let mut config = ClientConfig::new(self.project, session_id);
        config.api_url = self.api_url;
        config.ws_url = self.ws_url;
        config.request_timeout = Duration::from_secs(self.request_timeout);
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = args.client_config();
    tracing::info!(
        project = %config.project,
        api_url = %config.api_url,
        ws_url = %config.ws_url,
        "Starting scrapbox-mcp"
    );

    let client = ScrapboxClient::new(config).context("invalid client configuration")?;
    let mcp = ScrapboxMcp::new(client);

    let service = mcp
        .clone()
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("MCP server error: {:?}", e);
        })?;

    tracing::info!("scrapbox-mcp server ready");

    service.waiting().await?;

    mcp.client().close().await;
    tracing::info!("scrapbox-mcp server shutting down");
    Ok(())
}
