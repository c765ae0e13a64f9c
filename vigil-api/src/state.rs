//! Shared application state for Axum routers.

use std::sync::Arc;

use vigil_agents::Router;
use vigil_core::CallPolicy;
use vigil_schema::SchemaCatalog;

use crate::db::DbClient;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Pooled database client; doubles as the audit sink.
    pub db: DbClient,
    /// Classification + dispatch pipeline.
    pub router: Arc<Router>,
    /// Schema catalog, exposed for the explicit refresh entry point.
    pub catalog: Arc<SchemaCatalog>,
    /// Timeout/retry bounds for direct store calls from routes.
    pub policy: CallPolicy,
    pub start_time: std::time::Instant,
}
