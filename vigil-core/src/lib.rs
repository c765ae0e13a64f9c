//! VIGIL Core - Shared Domain Model
//!
//! Foundation types for the risk control tower:
//! - Decision model (verdict, severity, reasoning, provenance)
//! - Intent classification types (domain, entity set)
//! - Error taxonomy for every layer
//! - Environment-driven runtime configuration

pub mod call;
pub mod config;
pub mod decision;
pub mod error;

pub use call::bounded;
pub use config::{CallPolicy, LlmConfig, Thresholds};
pub use decision::{
    Classification, Decision, Domain, EntitySet, Reasoning, ReasoningSlot, RiskType, Severity,
    Verdict,
};
pub use error::{
    LlmError, MergeError, RouteError, SchemaError, StoreError, VigilError, VigilResult,
};
