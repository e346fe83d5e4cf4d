//! HTTP route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use askdb_chat::{ResponseEnvelope, SessionOrchestrator};
use askdb_core::types::TableSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::ws::WsTransport;

// =============================================================================
// Request / response types
// =============================================================================

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub database_configured: bool,
    /// Version of the active database configuration, if any.
    pub config_version: Option<u64>,
}

/// Request body for POST /api/configure.
#[derive(Debug, Deserialize)]
pub struct ConfigureRequest {
    pub connection_string: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigureResponse {
    pub status: String,
    pub message: String,
    pub version: u64,
    pub tables: Vec<String>,
}

/// Response body for GET /api/schema.
#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub version: u64,
    pub target: String,
    pub configured_at: DateTime<Utc>,
    pub tables: Vec<TableSchema>,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.registry.snapshot();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        database_configured: snapshot.is_some(),
        config_version: snapshot.map(|s| s.version),
    })
}

/// POST /api/configure - swap in a new database connection and schema.
///
/// On failure the previous configuration stays active. Unreadable bodies
/// get the same JSON error shape as every other failure.
pub async fn configure(
    State(state): State<AppState>,
    payload: Result<Json<ConfigureRequest>, JsonRejection>,
) -> Result<Json<ConfigureResponse>, ApiError> {
    let Json(req) = payload?;
    if req.connection_string.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Field 'connection_string' must not be empty".to_string(),
        ));
    }

    let snapshot = state.registry.configure(&req.connection_string).await?;
    let tables = snapshot.schema.table_names();
    Ok(Json(ConfigureResponse {
        status: "success".to_string(),
        message: format!("Database configured with {} tables", tables.len()),
        version: snapshot.version,
        tables,
    }))
}

/// GET /api/schema
pub async fn schema(State(state): State<AppState>) -> Result<Json<SchemaResponse>, ApiError> {
    let snapshot = state
        .registry
        .snapshot()
        .ok_or_else(|| ApiError::ServiceUnavailable("No database configured".to_string()))?;

    Ok(Json(SchemaResponse {
        version: snapshot.version,
        target: snapshot.target.clone(),
        configured_at: snapshot.configured_at,
        tables: snapshot.schema.tables.clone(),
    }))
}

/// POST /api/message - one exchange without a persistent connection.
///
/// The body is read as raw text so malformed payloads get the same error
/// envelope the websocket sends.
pub async fn message(State(state): State<AppState>, body: String) -> Json<ResponseEnvelope> {
    Json(state.pipeline.handle_text(&body).await)
}

/// GET /ws - upgrade and run one session for the life of the socket.
pub async fn ws(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| async move {
        let mut session = SessionOrchestrator::new(WsTransport::new(socket), state.pipeline);
        info!(session_id = %session.id(), "Websocket session started");
        session.run().await;
    })
}
