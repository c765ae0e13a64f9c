//! Read-only SQL endpoint
//!
//! `POST /api/sql` executes ad hoc read queries for the dashboard. The
//! guard is purely lexical: the query must begin with the read keyword,
//! case-insensitive. Execution errors are returned verbatim with
//! `success: false` since there is no analyzer-level fallback here.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use vigil_core::{bounded, StoreError};
use vigil_schema::{SqlRow, SqlStore};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct SqlRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SqlResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<SqlRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lexical read-only guard. Syntactic only; this is not a query-safety
/// analysis.
pub fn is_read_query(query: &str) -> bool {
    query.trim_start().to_uppercase().starts_with("SELECT")
}

/// POST /api/sql - run one read query.
pub async fn execute_sql(
    State(state): State<AppState>,
    Json(request): Json<SqlRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::invalid_input("SQL query parameter is required"));
    }
    if !is_read_query(query) {
        tracing::warn!("non-read query rejected");
        return Err(ApiError::forbidden("Only SELECT queries are allowed"));
    }

    let result = bounded(
        &state.policy,
        |timeout_ms| StoreError::Timeout { timeout_ms },
        || state.db.query(query, &[]),
    )
    .await;

    match result {
        Ok(rows) => {
            tracing::info!(rows = rows.len(), "sql query succeeded");
            Ok(Json(SqlResponse {
                success: true,
                row_count: Some(rows.len()),
                data: Some(rows),
                error: None,
            })
            .into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "sql query failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SqlResponse {
                    success: false,
                    data: None,
                    row_count: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response())
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
