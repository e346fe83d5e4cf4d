//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use askdb_chat::ExchangePipeline;
use askdb_core::config::AskDbConfig;
use askdb_llm::CompletionClient;
use askdb_storage::DatabaseRegistry;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. The registry
/// is the only mutable piece and swaps its snapshot atomically.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AskDbConfig>,
    pub registry: Arc<DatabaseRegistry>,
    /// Exchange processing shared by `/api/message` and every websocket session.
    pub pipeline: Arc<ExchangePipeline>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AskDbConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self::with_registry(config, Arc::new(DatabaseRegistry::new()), client)
    }

    pub fn with_registry(
        config: AskDbConfig,
        registry: Arc<DatabaseRegistry>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        let pipeline = ExchangePipeline::new(Arc::clone(&registry), client, &config);
        Self {
            config: Arc::new(config),
            registry,
            pipeline: Arc::new(pipeline),
            start_time: Instant::now(),
        }
    }
}
