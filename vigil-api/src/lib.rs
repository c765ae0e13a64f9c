//! VIGIL API - HTTP Boundary
//!
//! Axum server wiring for the risk control tower: route handlers, the
//! pooled Postgres client, structured errors, and shared state. Service
//! assembly lives in `main.rs`; everything here is importable for tests.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
