//! Health Check Endpoint
//!
//! Liveness only: a 200 means the process is serving requests. Database
//! and provider reachability are probed once at startup, not here.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /api/health - liveness check.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
