//! Query-string extractor with `validator` checks.

use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::Query;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Deserializes the query string and runs its `Validate` rules.
///
/// Repeated keys (`?code=a&code=b`) deserialize into sequence fields.
/// Malformed query strings map to `INVALID_QUERY`, rule violations to
/// `VALIDATION_ERROR` with per-field details. Both are 400s.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct Paging {
///     #[validate(range(max = 1000))]
///     size: Option<u64>,
/// }
///
/// async fn list(ValidatedQuery(paging): ValidatedQuery<Paging>) { /* ... */ }
/// ```
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}
