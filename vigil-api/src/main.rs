//! Vigil API Server Entry Point
//!
//! Bootstraps configuration, wires the schema catalog, analyzers and
//! router over the shared pool, probes the database and generation
//! provider once, and starts the Axum HTTP server.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vigil_agents::{AnalyzerContext, Router as IntentRouter};
use vigil_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, DbClient, DbConfig};
use vigil_core::{CallPolicy, LlmConfig, Thresholds};
use vigil_llm::{ChatClient, CompletionProvider, CompletionRequest, UnconfiguredProvider};
use vigil_schema::{SchemaCatalog, SqlStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;

    let llm_config = LlmConfig::from_env();
    let provider: Arc<dyn CompletionProvider> = match ChatClient::from_config(&llm_config) {
        Ok(client) => Arc::new(client),
        Err(_) => {
            tracing::warn!("no generation credentials configured; analyses will degrade");
            Arc::new(UnconfiguredProvider)
        }
    };

    let store: Arc<dyn SqlStore> = Arc::new(db.clone());
    let catalog = Arc::new(SchemaCatalog::new(Arc::clone(&store)));
    let policy = CallPolicy::from_env();

    let router = Arc::new(IntentRouter::new(AnalyzerContext {
        catalog: Arc::clone(&catalog),
        store,
        provider: Arc::clone(&provider),
        thresholds: Thresholds::from_env(),
        policy,
    }));

    run_startup_checks(&db, provider.as_ref(), llm_config.is_configured()).await;

    let state = AppState {
        db,
        router,
        catalog,
        policy,
        start_time: std::time::Instant::now(),
    };
    let app = create_api_router(state);

    let api_config = ApiConfig::from_env();
    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "starting Vigil API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}

/// One-shot connectivity probes. Failures are warnings, not fatal: the
/// analyzers degrade gracefully when a collaborator is down.
async fn run_startup_checks(
    db: &DbClient,
    provider: &dyn CompletionProvider,
    llm_configured: bool,
) {
    match db.health_check().await {
        Ok(()) => tracing::info!("database connection successful"),
        Err(e) => tracing::warn!(error = %e, "database connection failed; some features may not work"),
    }

    if !llm_configured {
        return;
    }
    let probe = CompletionRequest::new("Say 'OK'", 10);
    match provider.complete(&probe).await {
        Ok(_) => tracing::info!("generation provider reachable"),
        Err(e) => tracing::warn!(error = %e, "generation provider check failed; agent queries will degrade"),
    }
}
