//! Schema catalog
//!
//! Process-wide mapping from real table name to its ordered column list,
//! built once from `information_schema` and cached for the process
//! lifetime. Discovery failure is non-fatal: the catalog is cached empty
//! and every downstream lookup reports "not found" instead of erroring.

use crate::resolve::{normalize_table_name, ResolvedTable};
use crate::store::SqlStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use vigil_core::StoreError;

const DISCOVER_TABLES_SQL: &str = "SELECT table_name \
     FROM information_schema.tables \
     WHERE table_schema = 'public' \
     ORDER BY table_name";

const DISCOVER_COLUMNS_SQL: &str = "SELECT column_name \
     FROM information_schema.columns \
     WHERE table_name = $1 \
     ORDER BY ordinal_position";

// ============================================================================
// TABLE CATALOG
// ============================================================================

/// Immutable snapshot of the discovered schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCatalog {
    /// (table name, ordered columns), in discovery order.
    tables: Vec<(String, Vec<String>)>,
}

impl TableCatalog {
    pub fn new(tables: Vec<(String, Vec<String>)>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(name, _)| name.as_str())
    }

    /// Normalization-insensitive table lookup. Table names are unique in
    /// the catalog, so at most one entry can match.
    pub fn resolve_table(&self, name: &str) -> Option<ResolvedTable> {
        let wanted = normalize_table_name(name);
        self.tables
            .iter()
            .find(|(table, _)| normalize_table_name(table) == wanted)
            .map(|(table, columns)| ResolvedTable {
                name: table.clone(),
                columns: columns.clone(),
            })
    }
}

// ============================================================================
// SCHEMA CATALOG SERVICE
// ============================================================================

/// Lazily built, cached schema catalog over a shared store.
///
/// The first `catalog()` call performs discovery; concurrent first calls
/// coalesce on the internal mutex so the discovery queries run exactly
/// once, with every caller receiving the same completed snapshot. The cache
/// never invalidates itself; `refresh()` is the only rebuild entry point.
pub struct SchemaCatalog {
    store: Arc<dyn SqlStore>,
    cache: Mutex<Option<Arc<TableCatalog>>>,
}

impl SchemaCatalog {
    pub fn new(store: Arc<dyn SqlStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(None),
        }
    }

    /// Get the catalog, building it on first use. Total: discovery failure
    /// yields an empty catalog, logged as a warning.
    pub async fn catalog(&self) -> Arc<TableCatalog> {
        let mut cache = self.cache.lock().await;
        if let Some(catalog) = cache.as_ref() {
            return Arc::clone(catalog);
        }
        let built = Arc::new(self.discover().await);
        *cache = Some(Arc::clone(&built));
        built
    }

    /// Drop the cache and rebuild from the store. For schema-change
    /// scenarios only; nothing calls this automatically.
    pub async fn refresh(&self) -> Arc<TableCatalog> {
        let built = Arc::new(self.discover().await);
        let mut cache = self.cache.lock().await;
        *cache = Some(Arc::clone(&built));
        built
    }

    /// Resolve a table through the cached catalog.
    pub async fn resolve_table(&self, name: &str) -> Option<ResolvedTable> {
        self.catalog().await.resolve_table(name)
    }

    async fn discover(&self) -> TableCatalog {
        match self.discover_inner().await {
            Ok(catalog) => {
                tracing::info!(tables = catalog.len(), "schema catalog built");
                catalog
            }
            Err(e) => {
                tracing::warn!(error = %e, "schema discovery failed; serving empty catalog");
                TableCatalog::default()
            }
        }
    }

    async fn discover_inner(&self) -> Result<TableCatalog, StoreError> {
        let table_rows = self.store.query(DISCOVER_TABLES_SQL, &[]).await?;
        let mut tables = Vec::with_capacity(table_rows.len());

        for row in table_rows {
            let Some(name) = row.get("table_name").and_then(|v| v.as_str()) else {
                continue;
            };
            match self
                .store
                .query(DISCOVER_COLUMNS_SQL, &[name.to_string()])
                .await
            {
                Ok(column_rows) => {
                    let columns: Vec<String> = column_rows
                        .iter()
                        .filter_map(|r| r.get("column_name").and_then(|v| v.as_str()))
                        .map(|c| c.to_string())
                        .collect();
                    // Tables the store reports but will not describe are
                    // unusable; leave them out.
                    if !columns.is_empty() {
                        tables.push((name.to_string(), columns));
                    }
                }
                Err(e) => {
                    tracing::warn!(table = name, error = %e, "column discovery failed; skipping table");
                }
            }
        }

        Ok(TableCatalog::new(tables))
    }
}

impl std::fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCatalog").finish_non_exhaustive()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
