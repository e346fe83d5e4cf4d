//! askdb API crate - axum HTTP server and websocket session endpoint.
//!
//! Exposes the control operation (`/api/configure`), the schema view, a
//! one-shot message endpoint, health, and the persistent `/ws` session.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
