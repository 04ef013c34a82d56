//! API route handlers for the clipdeck server.

pub mod config;
pub mod downloads;
pub mod events;
pub mod health;
pub mod history;
pub mod info;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check (version, uptime, engine availability)
/// - POST /api/info - Probe metadata for one or more URLs
/// - POST /api/download - Submit a batch of downloads
/// - GET  /api/status - Snapshot of all download records
/// - GET  /api/status/{id} - One download record
/// - POST /api/cancel/{id} - Advisory cancellation
/// - GET  /api/history - Recent terminal outcomes
/// - POST /api/clear-history - Drop all history entries
/// - GET  /api/events - SSE stream of progress events
/// - GET  /api/config - Server capabilities and defaults
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", info::router())
        .nest("/api", downloads::router())
        .nest("/api", history::router())
        .nest("/api", events::router())
        .nest("/api", config::router())
        .with_state(state)
}
