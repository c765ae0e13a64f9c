//! Data store abstraction
//!
//! `SqlStore` is the only seam between the analysis pipeline and the
//! database. Queries carry their user-influenced values as positional bind
//! parameters; no caller ever splices entity text into SQL.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vigil_core::StoreError;

/// A single result row: column name to JSON value, keys sorted.
pub type SqlRow = serde_json::Map<String, JsonValue>;

/// Async read access to the data store.
///
/// Implementations must be thread-safe; analyzers share one store behind an
/// `Arc` and may query it concurrently.
#[async_trait]
pub trait SqlStore: Send + Sync {
    /// Execute a read query. `params` bind positionally to `$1..$n`
    /// placeholders in `sql`; all analytical parameters are strings.
    async fn query(&self, sql: &str, params: &[String]) -> Result<Vec<SqlRow>, StoreError>;
}

// ============================================================================
// IN-MEMORY STORE FOR TESTING
// ============================================================================

/// In-memory `SqlStore` used by unit tests.
///
/// Understands the two schema-discovery queries (matched on their
/// `information_schema` source) and serves canned rows for data queries,
/// matched by `FROM <table>`. Failures can be injected globally or per
/// SQL fragment.
#[derive(Default)]
pub struct MemoryStore {
    tables: Vec<(String, Vec<String>)>,
    rows: HashMap<String, Vec<SqlRow>>,
    fail_all: Option<String>,
    fail_matching: Vec<(String, String)>,
    query_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with its ordered column list.
    pub fn with_table(mut self, name: &str, columns: &[&str]) -> Self {
        self.tables
            .push((name.to_string(), columns.iter().map(|c| c.to_string()).collect()));
        self
    }

    /// Register canned rows returned for any query reading `table`.
    pub fn with_rows(mut self, table: &str, rows: Vec<SqlRow>) -> Self {
        self.rows.insert(table.to_lowercase(), rows);
        self
    }

    /// Every query fails with the given reason.
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_all: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Queries whose SQL contains `fragment` (case-insensitive) fail.
    pub fn with_failure_on(mut self, fragment: &str, reason: &str) -> Self {
        self.fail_matching
            .push((fragment.to_lowercase(), reason.to_string()));
        self
    }

    /// Number of queries executed, for single-flight assertions.
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    pub fn into_shared(self) -> Arc<dyn SqlStore> {
        Arc::new(self)
    }

    fn row_of(pairs: &[(&str, JsonValue)]) -> SqlRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

#[async_trait]
impl SqlStore for MemoryStore {
    async fn query(&self, sql: &str, params: &[String]) -> Result<Vec<SqlRow>, StoreError> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        let lowered = sql.to_lowercase();

        if let Some(reason) = &self.fail_all {
            return Err(StoreError::QueryFailed {
                reason: reason.clone(),
            });
        }
        for (fragment, reason) in &self.fail_matching {
            if lowered.contains(fragment) {
                return Err(StoreError::QueryFailed {
                    reason: reason.clone(),
                });
            }
        }

        if lowered.contains("information_schema.tables") {
            return Ok(self
                .tables
                .iter()
                .map(|(name, _)| {
                    Self::row_of(&[("table_name", JsonValue::String(name.clone()))])
                })
                .collect());
        }

        if lowered.contains("information_schema.columns") {
            let table = params.first().cloned().unwrap_or_default();
            return Ok(self
                .tables
                .iter()
                .find(|(name, _)| *name == table)
                .map(|(_, columns)| {
                    columns
                        .iter()
                        .map(|c| Self::row_of(&[("column_name", JsonValue::String(c.clone()))]))
                        .collect()
                })
                .unwrap_or_default());
        }

        for (table, rows) in &self.rows {
            if lowered.contains(&format!("from {}", table))
                || lowered.contains(&format!("from \"{}\"", table))
            {
                return Ok(rows.clone());
            }
        }

        Ok(Vec::new())
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
