//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use askdb_core::config::AskDbConfig;
use askdb_core::error::Result;

use crate::handlers;
use crate::state::AppState;

/// Port of the browser front end during development.
const FRONTEND_DEV_PORT: u16 = 3000;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let port = state.config.server.port;
    let origins: Vec<HeaderValue> = [port, FRONTEND_DEV_PORT]
        .iter()
        .flat_map(|p| {
            [
                format!("http://127.0.0.1:{}", p),
                format!("http://localhost:{}", p),
            ]
        })
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws", get(handlers::ws))
        .route("/api/configure", post(handlers::configure))
        .route("/api/schema", get(handlers::schema))
        .route("/api/message", post(handlers::message))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind to the configured address and serve until the process exits.
pub async fn start_server(config: &AskDbConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
