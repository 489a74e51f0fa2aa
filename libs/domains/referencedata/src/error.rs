use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, Localized};
use sea_orm::DbErr;
use strum::{Display, IntoStaticStr};
use thiserror::Error;
use uuid::Uuid;

/// Localization keys sent to clients alongside error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum MessageKey {
    #[strum(serialize = "referenceData.error.facility.notFound")]
    FacilityNotFound,
    #[strum(serialize = "referenceData.error.search.facilityAndFacilityType.mutuallyExclusive")]
    FacilityAndFacilityTypeMutuallyExclusive,
    #[strum(serialize = "referenceData.error.search.programAndProgramCode.mutuallyExclusive")]
    ProgramAndProgramCodeMutuallyExclusive,
    #[strum(serialize = "referenceData.error.search.orderableId.invalid")]
    OrderableIdInvalid,
}

impl MessageKey {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// English fallback for clients that do not localize.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::FacilityNotFound => "Facility not found",
            Self::FacilityAndFacilityTypeMutuallyExclusive => {
                "Facility and facility type cannot both be given"
            }
            Self::ProgramAndProgramCodeMutuallyExclusive => {
                "Program and program code cannot both be given"
            }
            Self::OrderableIdInvalid => "Orderable id is not a valid UUID",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("{id} not found [{key}]")]
    NotFound { key: MessageKey, id: Uuid },

    #[error("Invalid search: {details} [{key}]")]
    Validation { key: MessageKey, details: String },

    #[error("Data access failed: {0}")]
    DataAccess(#[from] DbErr),
}

impl ReferenceDataError {
    pub fn facility_not_found(id: Uuid) -> Self {
        Self::NotFound {
            key: MessageKey::FacilityNotFound,
            id,
        }
    }

    pub fn validation(key: MessageKey, details: impl Into<String>) -> Self {
        Self::Validation {
            key,
            details: details.into(),
        }
    }

    /// The localization key, if this error carries one.
    pub fn message_key(&self) -> Option<MessageKey> {
        match self {
            Self::NotFound { key, .. } | Self::Validation { key, .. } => Some(*key),
            Self::DataAccess(_) => None,
        }
    }
}

pub type ReferenceDataResult<T> = Result<T, ReferenceDataError>;

impl From<ReferenceDataError> for AppError {
    fn from(err: ReferenceDataError) -> Self {
        match err {
            ReferenceDataError::NotFound { key, id } => AppError::NotFound(
                Localized::new(key.default_message())
                    .with_key(key.as_str())
                    .with_param(id),
            ),
            ReferenceDataError::Validation { key, details } => AppError::BadRequest(
                Localized::new(key.default_message())
                    .with_key(key.as_str())
                    .with_param(details),
            ),
            ReferenceDataError::DataAccess(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for ReferenceDataError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_message_keys_render_as_localization_keys() {
        assert_eq!(
            MessageKey::FacilityNotFound.as_str(),
            "referenceData.error.facility.notFound"
        );
        assert_eq!(
            MessageKey::OrderableIdInvalid.to_string(),
            "referenceData.error.search.orderableId.invalid"
        );
    }

    #[test]
    fn test_not_found_maps_to_404_with_key_and_id() {
        let id = Uuid::now_v7();
        let app_error: AppError = ReferenceDataError::facility_not_found(id).into();

        assert_eq!(app_error.status(), StatusCode::NOT_FOUND);
        match app_error {
            AppError::NotFound(localized) => {
                assert_eq!(
                    localized.message_key.as_deref(),
                    Some("referenceData.error.facility.notFound")
                );
                assert_eq!(localized.params, vec![id.to_string()]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_maps_to_400() {
        let error = ReferenceDataError::validation(
            MessageKey::ProgramAndProgramCodeMutuallyExclusive,
            "program, programCode",
        );
        assert_eq!(
            error.message_key(),
            Some(MessageKey::ProgramAndProgramCodeMutuallyExclusive)
        );

        let app_error: AppError = error.into();
        assert_eq!(app_error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_data_access_keeps_store_error_class() {
        let unreachable = ReferenceDataError::DataAccess(DbErr::Conn(RuntimeErr::Internal(
            "connection refused".into(),
        )));
        assert!(unreachable.message_key().is_none());
        assert_eq!(
            AppError::from(unreachable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let broken = ReferenceDataError::DataAccess(DbErr::Custom("syntax error".into()));
        assert_eq!(
            AppError::from(broken).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
