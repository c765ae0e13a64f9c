//! Table and column resolution
//!
//! Tables are matched normalization-insensitively (case, underscores and
//! hyphens are stripped), so `Re-Evaluation`, `re_evaluation` and
//! `reevaluation` all name the same catalog entry. Columns are resolved
//! from priority-ordered semantic terms: earlier terms always win over
//! later ones, even if a later term would match more columns.

use serde::{Deserialize, Serialize};

/// Strip case, underscores and hyphens for table-name comparison.
pub fn normalize_table_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// A table as it actually exists in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTable {
    /// Real table name, exactly as the catalog reports it.
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<String>,
}

/// A semantic column role with its priority-ordered candidate terms.
///
/// Term lists are data, not code: each domain profile declares the roles it
/// needs and the resolver finds the concrete columns at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRole {
    pub name: &'static str,
    pub terms: &'static [&'static str],
}

impl ColumnRole {
    pub const fn new(name: &'static str, terms: &'static [&'static str]) -> Self {
        Self { name, terms }
    }

    /// Resolve this role against a column list.
    pub fn resolve(&self, columns: &[String]) -> Option<String> {
        resolve_column(columns, self.terms)
    }
}

/// Find the first column matching any term, trying terms strictly in
/// priority order. Each term is a case-insensitive substring probe over the
/// columns in ordinal order; the first hit across the whole term list wins.
pub fn resolve_column(columns: &[String], terms: &[&str]) -> Option<String> {
    for term in terms {
        let term = term.to_lowercase();
        for column in columns {
            if column.to_lowercase().contains(&term) {
                return Some(column.clone());
            }
        }
    }
    None
}

// ============================================================================
// UNIT TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
