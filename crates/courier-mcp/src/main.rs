//! Courier MCP adapter binary
//!
//! Speaks JSON-RPC over stdin/stdout. All configuration comes from the
//! environment; tracing output goes to stderr so the protocol channel stays
//! clean.

use courier_auth::{CredentialStore, Provider, ProviderConfig};
use courier_mcp::clients::AdapterConfig;
use courier_mcp::server::McpServer;
use courier_mcp::tools::all_tools;
use std::process;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Read a required environment variable or exit with a usage message.
fn require_env(name: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            eprintln!("Missing required environment variable: {}", name);
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let credential_file = require_env("COURIER_CREDENTIAL_FILE");
    let client_id = require_env("COURIER_CLIENT_ID");
    let client_secret = require_env("COURIER_CLIENT_SECRET");
    let provider_name = require_env("COURIER_PROVIDER");

    let provider = match Provider::parse(&provider_name) {
        Some(p) => p,
        None => {
            eprintln!("Unknown provider: {}", provider_name);
            process::exit(1);
        }
    };

    let redirect_url = std::env::var("COURIER_REDIRECT_URL")
        .unwrap_or_else(|_| "http://localhost:3000/callback".to_string());

    let provider_config = ProviderConfig::new(provider, client_id, client_secret, redirect_url);
    let store = Arc::new(CredentialStore::new(&credential_file, provider_config));

    let adapter_config = AdapterConfig::from_env();

    let server = McpServer::courier().with_store(store.clone());
    server
        .register_tools(all_tools(&adapter_config, store))
        .await;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        provider = provider.as_str(),
        "Courier MCP adapter starting"
    );

    if let Err(e) = courier_mcp::stdio::serve(server).await {
        eprintln!("Transport error: {}", e);
        process::exit(1);
    }
}
