#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;
pub mod trace_ctx;
pub mod utils;


// Re-exports for public API
pub use client::{LocalAction, LocalBackend, ParticipantDriver, ParticipantHandle, SessionBackend};
pub use config::db::{db_url, DbKind};
pub use config::engine::EngineConfig;
pub use error::AppError;
pub use errors::domain::DomainError;
pub use infra::db::{bootstrap_db, connect_db};
pub use infra::state::build_state;
pub use middleware::cors::cors_middleware;
pub use middleware::request_trace::RequestTrace;
pub use middleware::structured_logger::StructuredLogger;
pub use middleware::trace_span::TraceSpan;
pub use state::app_state::AppState;
pub use sync::{SyncEvent, SyncHub};

// Prelude for test convenience
pub mod prelude {
    pub use super::config::db::*;
    pub use super::config::engine::*;
    pub use super::error::*;
    pub use super::errors::domain::*;
    pub use super::state::*;
}

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
