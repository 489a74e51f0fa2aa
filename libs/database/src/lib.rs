//! PostgreSQL connectivity for the reference-data service.
//!
//! Owns the pooled SeaORM connection: environment-driven pool settings,
//! connect-with-retry for container start-up races, migration running and
//! the `SELECT 1` check behind `/ready`.
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::common::RetryConfig;
//! use database::postgres::{self, PostgresConfig};
//!
//! let db = postgres::connect_from_config_with_retry(
//!     PostgresConfig::from_env()?,
//!     Some(RetryConfig::from_env()?),
//! )
//! .await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "referencedata_api").await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};
