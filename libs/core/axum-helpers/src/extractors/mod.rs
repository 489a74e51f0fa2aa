//! Request extractors that reject with [`AppError`](crate::errors::AppError) bodies.

pub mod validated_query;

pub use validated_query::ValidatedQuery;
