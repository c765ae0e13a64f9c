//! Database Connection Pool Module
//!
//! PostgreSQL access through deadpool-postgres. `DbClient` is the concrete
//! `SqlStore` behind the schema catalog and the analyzers, converts rows
//! to JSON values for schema-independent consumption, and owns the
//! append-only audit insert.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime, Timeouts};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{NoTls, Row};
use vigil_core::{Decision, StoreError};
use vigil_schema::{SqlRow, SqlStore};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub max_size: usize,
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "clinical_supply_db".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("VIGIL_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("VIGIL_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("VIGIL_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("VIGIL_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("VIGIL_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("VIGIL_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: Duration::from_secs(
                std::env::var("VIGIL_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(deadpool_postgres::PoolConfig {
            max_size: self.max_size,
            timeouts: Timeouts {
                wait: Some(self.timeout),
                create: Some(self.timeout),
                recycle: Some(self.timeout),
            },
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Pooled database client.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Connectivity probe used by startup checks.
    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    /// Execute a read query and convert rows to JSON values.
    pub async fn run_query(&self, sql: &str, params: &[String]) -> ApiResult<Vec<SqlRow>> {
        let conn = self.get_conn().await?;
        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = conn.query(sql, &bound).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    // ========================================================================
    // AUDIT SINK
    // ========================================================================

    /// Append one terminal decision to the audit table. Callers skip
    /// degraded decisions; failures here never fail the request.
    pub async fn log_decision(&self, decision: &Decision) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        let decision_json = serde_json::to_value(decision)
            .map_err(|e| ApiError::internal_error(format!("Decision serialization: {}", e)))?;
        let source_tables = JsonValue::from(decision.source_tables.clone());

        conn.execute(
            "INSERT INTO ai_decisions (decision_json, decision_type, source_tables, timestamp) \
             VALUES ($1, $2, $3, $4)",
            &[
                &decision_json,
                &decision.risk_type.to_string(),
                &source_tables,
                &Utc::now(),
            ],
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SqlStore for DbClient {
    async fn query(&self, sql: &str, params: &[String]) -> Result<Vec<SqlRow>, StoreError> {
        self.run_query(sql, params)
            .await
            .map_err(|e| StoreError::QueryFailed {
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("DbClient")
            .field("pool_size", &status.size)
            .finish()
    }
}

// ============================================================================
// ROW CONVERSION
// ============================================================================

/// Convert one database row to a JSON object, keyed by column name.
/// Types outside the supported set degrade to null rather than erroring;
/// the analyzers treat row values as opaque JSON anyway.
fn row_to_json(row: &Row) -> SqlRow {
    let mut out = SqlRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        let ty: &Type = column.type_();
        let value = if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(index)
                .ok()
                .flatten()
                .map(JsonValue::from)
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(index)
                .ok()
                .flatten()
                .map(JsonValue::from)
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(index)
                .ok()
                .flatten()
                .map(JsonValue::from)
        } else if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(index)
                .ok()
                .flatten()
                .map(JsonValue::from)
        } else if *ty == Type::FLOAT4 {
            row.try_get::<_, Option<f32>>(index)
                .ok()
                .flatten()
                .map(JsonValue::from)
        } else if *ty == Type::FLOAT8 {
            row.try_get::<_, Option<f64>>(index)
                .ok()
                .flatten()
                .map(JsonValue::from)
        } else if *ty == Type::DATE {
            row.try_get::<_, Option<chrono::NaiveDate>>(index)
                .ok()
                .flatten()
                .map(|d| JsonValue::from(d.to_string()))
        } else if *ty == Type::TIMESTAMP {
            row.try_get::<_, Option<chrono::NaiveDateTime>>(index)
                .ok()
                .flatten()
                .map(|t| JsonValue::from(t.to_string()))
        } else if *ty == Type::TIMESTAMPTZ {
            row.try_get::<_, Option<chrono::DateTime<Utc>>>(index)
                .ok()
                .flatten()
                .map(|t| JsonValue::from(t.to_rfc3339()))
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            row.try_get::<_, Option<JsonValue>>(index).ok().flatten()
        } else {
            // TEXT, VARCHAR and everything else that reads as a string.
            // NUMERIC has no native mapping here and also lands on null.
            row.try_get::<_, Option<String>>(index)
                .ok()
                .flatten()
                .map(JsonValue::from)
        };
        out.insert(
            column.name().to_string(),
            value.unwrap_or(JsonValue::Null),
        );
    }
    out
}

// ============================================================================
// UNIT TESTS
// ============================================================================
