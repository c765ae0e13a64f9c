//! REST API Routes Module
//!
//! Route handlers plus the router composition:
//! - `POST /api/query`  - natural-language risk analysis
//! - `POST /api/sql`    - read-only ad hoc queries
//! - `POST /api/schema/refresh` - explicit catalog rebuild
//! - `GET  /api/health` - liveness
//!
//! CORS is permissive: the dashboard is a browser client on another
//! origin.

pub mod health;
pub mod query;
pub mod sql;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full API router over the shared state.
pub fn create_api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/query", post(query::process_query))
        .route("/api/sql", post(sql::execute_sql))
        .route("/api/schema/refresh", post(query::refresh_schema))
        .route("/api/health", get(health::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
