//! Natural-language query endpoint
//!
//! `POST /api/query` runs the full pipeline: classify, dispatch to one
//! analyzer, return the decision. Only classification failure surfaces as
//! an HTTP error; analyzer failures arrive as degraded decisions with
//! status 200. Terminal non-degraded decisions are appended to the audit
//! sink; an audit failure annotates the response instead of failing it.

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub tables: usize,
}

/// POST /api/query - classify and analyze one operational question.
pub async fn process_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<impl IntoResponse> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::invalid_input("Query parameter is required"));
    }

    tracing::info!(query, "query received");

    let decision = state
        .router
        .handle(query)
        .await
        .map_err(|e| ApiError::classification_failed(e.to_string()))?;

    tracing::info!(
        decision = %decision.decision,
        severity = %decision.severity,
        risk_type = %decision.risk_type,
        degraded = decision.is_degraded(),
        "decision reached"
    );

    let mut body = serde_json::to_value(&decision)
        .map_err(|e| ApiError::internal_error(format!("Decision serialization: {}", e)))?;

    // Degraded decisions are not audit-worthy; everything else is.
    if !decision.is_degraded() {
        if let Err(e) = state.db.log_decision(&decision).await {
            tracing::warn!(error = %e, "audit insert failed");
            body["log_warning"] =
                JsonValue::String(format!("Failed to log decision: {}", e));
        } else {
            tracing::info!("decision logged to audit sink");
        }
    }

    Ok(Json(body))
}

/// POST /api/schema/refresh - explicit catalog rebuild for schema-change
/// scenarios. Never triggered automatically.
pub async fn refresh_schema(
    State(state): State<AppState>,
) -> ApiResult<Json<RefreshResponse>> {
    let catalog = state.catalog.refresh().await;
    tracing::info!(tables = catalog.len(), "schema catalog refreshed");
    Ok(Json(RefreshResponse {
        tables: catalog.len(),
    }))
}
