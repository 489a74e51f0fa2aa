pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::QueryRejection;
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Standard error response body.
///
/// ```json
/// {
///   "code": 1004,
///   "error": "NOT_FOUND",
///   "message": "Facility not found",
///   "messageKey": "referenceData.error.facility.notFound",
///   "params": ["0f3b2c1e-..."]
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Localization key clients use to render their own message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,
    /// Values substituted into the localized message, e.g. the offending id
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// A client-facing message with an optional localization key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localized {
    pub message: String,
    pub message_key: Option<String>,
    pub params: Vec<String>,
}

impl Localized {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            message_key: None,
            params: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = Some(key.into());
        self
    }

    pub fn with_param(mut self, param: impl ToString) -> Self {
        self.params.push(param.to_string());
        self
    }
}

impl std::fmt::Display for Localized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message_key {
            Some(key) => write!(f, "{} [{}]", self.message, key),
            None => f.write_str(&self.message),
        }
    }
}

impl From<String> for Localized {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for Localized {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(Localized),

    #[error("Not Found: {0}")]
    NotFound(Localized),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

struct ErrorParts {
    status: StatusCode,
    code: ErrorCode,
    message: String,
    message_key: Option<String>,
    params: Vec<String>,
    details: Option<serde_json::Value>,
}

impl ErrorParts {
    fn new(status: StatusCode, code: ErrorCode) -> Self {
        Self {
            status,
            code,
            message: code.default_message().to_string(),
            message_key: None,
            params: Vec::new(),
            details: None,
        }
    }

    fn localized(status: StatusCode, code: ErrorCode, localized: Localized) -> Self {
        Self {
            message: localized.message,
            message_key: localized.message_key,
            params: localized.params,
            ..Self::new(status, code)
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        self.parts().status
    }

    fn parts(&self) -> ErrorParts {
        match self {
            AppError::SerdeJson(_) => {
                ErrorParts::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::SerdeJsonError)
            }
            AppError::Database(e) => map_db_error(e),
            AppError::QueryRejection(e) => ErrorParts {
                message: e.to_string(),
                ..ErrorParts::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidQuery)
            },
            AppError::Validation(e) => ErrorParts {
                details: serde_json::to_value(e).ok(),
                ..ErrorParts::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError)
            },
            AppError::BadRequest(l) => {
                ErrorParts::localized(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, l.clone())
            }
            AppError::NotFound(l) => {
                ErrorParts::localized(StatusCode::NOT_FOUND, ErrorCode::NotFound, l.clone())
            }
            AppError::InternalServerError(msg) => ErrorParts {
                message: msg.clone(),
                ..ErrorParts::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
            },
            AppError::ServiceUnavailable(msg) => ErrorParts {
                message: msg.clone(),
                ..ErrorParts::new(StatusCode::SERVICE_UNAVAILABLE, ErrorCode::ServiceUnavailable)
            },
        }
    }
}

/// Connection-level failures are transient (503); everything else is a 500.
fn map_db_error(error: &DbErr) -> ErrorParts {
    match error {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
            ErrorParts::new(StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DatabaseUnavailable)
        }
        DbErr::RecordNotFound(_) => {
            ErrorParts::new(StatusCode::NOT_FOUND, ErrorCode::DatabaseNotFound)
        }
        _ => ErrorParts::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let parts = self.parts();
        let error_code = parts.code.code();

        if parts.status.is_server_error() {
            tracing::error!(error_code, status = parts.status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::info!(
                error_code,
                status = parts.status.as_u16(),
                message_key = parts.message_key.as_deref(),
                error = %self,
                "Request rejected"
            );
        }

        let body = Json(ErrorResponse {
            code: error_code,
            error: parts.code.as_str().to_string(),
            message: parts.message,
            message_key: parts.message_key,
            params: parts.params,
            details: parts.details,
        });

        (parts.status, body).into_response()
    }
}

/// Build an error response without going through [`AppError`].
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    let body = Json(ErrorResponse {
        code: error_code.code(),
        error: error_code.as_str().to_string(),
        message,
        message_key: None,
        params: Vec::new(),
        details: None,
    });

    (status, body).into_response()
}
