//! Error types for Vigil operations

use thiserror::Error;

/// Schema discovery and resolution errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema discovery failed: {reason}")]
    DiscoveryFailed { reason: String },

    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    #[error("Column for role '{role}' not resolved in table {table}")]
    ColumnNotResolved { table: String, role: String },
}

/// Data store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Query execution failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Connection pool unavailable: {reason}")]
    PoolUnavailable { reason: String },

    #[error("Store call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Generation provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No generation provider configured")]
    NotConfigured,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Structured response parse failed: {reason}")]
    ParseFailed { reason: String },

    #[error("Generation call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Routing errors. Classification parse failure is the single error the
/// subsystem allows to reach the HTTP boundary; every other failure is
/// absorbed into a degraded decision.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Intent classification failed: {reason}")]
    ClassificationFailed { reason: String },
}

/// Decision synthesis errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("Cannot merge an empty decision list")]
    EmptyInput,
}

/// Master error type for all Vigil errors.
#[derive(Debug, Clone, Error)]
pub enum VigilError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),
}

/// Result type alias for Vigil operations.
pub type VigilResult<T> = Result<T, VigilError>;

// =============================================================================
// TESTS
// =============================================================================
