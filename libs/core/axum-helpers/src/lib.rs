//! # Axum Helpers
//!
//! Shared HTTP plumbing for the reference-data service.
//!
//! - **[`errors`]**: `AppError` → JSON `ErrorResponse` with error codes and localization keys
//! - **[`extractors`]**: `ValidatedQuery` for query strings checked with `validator`
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router assembly, health/readiness, graceful shutdown

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse, Localized};
pub use extractors::ValidatedQuery;
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_app, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};
