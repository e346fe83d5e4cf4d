//! askdb application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialise tracing
//! 3. Build the completion client and shared state
//! 4. Configure the startup database, if one is named
//! 5. Serve HTTP and websocket sessions

mod cli;

use std::sync::Arc;

use clap::Parser;

use askdb_api::{routes, AppState};
use askdb_core::config::AskDbConfig;
use askdb_llm::{CompletionClient, OpenAiClient};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = AskDbConfig::load_or_default(&config_file);
    config.server.host = args.resolve_host(&config.server.host);
    config.server.port = args.resolve_port(config.server.port);
    config.database.url = args.resolve_database_url(config.database.url.as_deref());
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing. RUST_LOG wins over the resolved level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting askdb v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Completion client.
    let client = OpenAiClient::from_config(&config.llm)?;
    if !client.has_api_key() {
        tracing::warn!(
            env = %config.llm.api_key_env,
            "No API key found; completion requests will fail until it is set"
        );
    }
    tracing::info!(model = %client.model(), endpoint = %client.endpoint(), "Completion client ready");
    let client: Arc<dyn CompletionClient> = Arc::new(client);

    let state = AppState::new(config.clone(), client);

    // Startup database. A failure leaves the server running unconfigured.
    if let Some(url) = config.database.url.as_deref() {
        match state.registry.configure(url).await {
            Ok(snapshot) => tracing::info!(
                version = snapshot.version,
                tables = snapshot.schema.tables.len(),
                "Startup database configured"
            ),
            Err(e) => tracing::warn!(error = %e, "Startup database configuration failed"),
        }
    }

    routes::start_server(&config, state).await?;
    Ok(())
}
