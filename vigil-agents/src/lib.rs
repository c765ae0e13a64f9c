//! VIGIL Agents - Risk Analysis Pipeline
//!
//! The analytical heart of the control tower:
//! - Intent routing from free text to a risk domain plus entities
//! - A single generic domain analyzer instantiated for five domains
//! - Schema-driven, parametrized analytical query construction
//! - Deterministic synthesis of several decisions into one
//!
//! Analyzers are total: every internal failure becomes a degraded
//! decision. Only classification parse failure escapes to the caller.

pub mod analyzer;
pub mod profile;
pub mod query;
pub mod router;
pub mod synthesis;

pub use analyzer::{AnalyzerContext, AnalyzerSet, DomainAnalyzer};
pub use profile::{AnalyzerProfile, FilterEntity, QueryShape};
pub use query::{build_query, BuiltQuery, QueryBuildError};
pub use router::{intent_unclear, Router};
pub use synthesis::{consolidate, merge};
