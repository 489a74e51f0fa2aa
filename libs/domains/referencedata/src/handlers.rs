use axum::{Json, Router, extract::State, routing::get};
use axum_helpers::{
    ValidatedQuery,
    errors::responses::{
        BadRequestResponse, InternalServerErrorResponse, NotFoundResponse,
        ServiceUnavailableResponse,
    },
};
use observability::{SearchMetrics, SearchOutcome};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};
use uuid::Uuid;
use validator::Validate;

use crate::error::{MessageKey, ReferenceDataError, ReferenceDataResult};
use crate::models::{
    Code, Dispensable, FacilityType, FacilityTypeApprovedProduct, Orderable, ProductCategory,
    Program, ProgramOrderable,
};
use crate::pagination::{Page, PageRequest};
use crate::repository::FtapRepository;
use crate::search::{FacilityReference, FtapSearchParams, ProgramReference};
use crate::service::FtapSearchService;

const TAG: &str = "facilityTypeApprovedProducts";

/// OpenAPI documentation for the reference-data search API
#[derive(OpenApi)]
#[openapi(
    paths(search_approved_products),
    components(
        schemas(
            FacilityTypeApprovedProduct,
            Orderable,
            ProgramOrderable,
            ProductCategory,
            Dispensable,
            FacilityType,
            Program,
            Code
        ),
        responses(
            BadRequestResponse,
            NotFoundResponse,
            InternalServerErrorResponse,
            ServiceUnavailableResponse
        )
    ),
    tags(
        (name = TAG, description = "Facility type approved product search")
    )
)]
pub struct ApiDoc;

pub fn router<R: FtapRepository + 'static>(service: FtapSearchService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/facilityTypeApprovedProducts", get(search_approved_products))
        .with_state(shared_service)
}

/// Query string of the approved product search.
///
/// List-valued parameters accept repeated keys, comma-separated values, or both.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FtapSearchQuery {
    /// Facility whose type the approvals apply to
    pub facility: Option<Uuid>,
    /// Facility type codes, e.g. `health_center,district_store`
    #[serde(default)]
    #[validate(length(max = 256))]
    pub facility_type: Vec<String>,
    pub program: Option<Uuid>,
    #[validate(length(max = 255))]
    pub program_code: Option<String>,
    pub full_supply: Option<bool>,
    /// Orderable ids
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub orderable_id: Vec<String>,
    /// Defaults to `true`
    pub active: Option<bool>,
    /// Zero-based page index
    pub page: Option<u64>,
    /// Page size; omit or 0 for all results
    #[validate(range(max = 10000))]
    pub size: Option<u64>,
}

impl FtapSearchQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(0),
            size: self.size,
        }
    }
}

fn split_list(values: &[String]) -> impl Iterator<Item = &str> {
    values
        .iter()
        .flat_map(|raw| raw.split(','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

impl TryFrom<FtapSearchQuery> for FtapSearchParams {
    type Error = ReferenceDataError;

    fn try_from(query: FtapSearchQuery) -> Result<Self, Self::Error> {
        let facility_types: Vec<String> = split_list(&query.facility_type)
            .map(str::to_string)
            .collect();

        let facility = match (query.facility, facility_types.is_empty()) {
            (Some(_), false) => {
                return Err(ReferenceDataError::validation(
                    MessageKey::FacilityAndFacilityTypeMutuallyExclusive,
                    "facility, facilityType",
                ));
            }
            (Some(id), true) => Some(FacilityReference::Facility(id)),
            (None, false) => Some(FacilityReference::FacilityTypeCodes(facility_types)),
            (None, true) => None,
        };

        let program_code = query
            .program_code
            .filter(|code| !code.trim().is_empty());
        let program = match (query.program, program_code) {
            (Some(_), Some(_)) => {
                return Err(ReferenceDataError::validation(
                    MessageKey::ProgramAndProgramCodeMutuallyExclusive,
                    "program, programCode",
                ));
            }
            (Some(id), None) => Some(ProgramReference::Id(id)),
            (None, Some(code)) => Some(ProgramReference::Code(code)),
            (None, None) => None,
        };

        let orderable_ids = split_list(&query.orderable_id)
            .map(|id| {
                Uuid::parse_str(id)
                    .map_err(|_| ReferenceDataError::validation(MessageKey::OrderableIdInvalid, id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FtapSearchParams {
            facility,
            program,
            full_supply: query.full_supply,
            orderable_ids,
            active: query.active,
        })
    }
}

/// Search facility type approved products
///
/// Returns the latest version of each matching approval, ordered by id then
/// version. Inactive approvals are only returned with `active=false`.
#[utoipa::path(
    get,
    path = "/facilityTypeApprovedProducts",
    tag = TAG,
    params(FtapSearchQuery),
    responses(
        (status = 200, description = "Page of approved products", body = Page<FacilityTypeApprovedProduct>),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn search_approved_products<R: FtapRepository>(
    State(service): State<Arc<FtapSearchService<R>>>,
    ValidatedQuery(query): ValidatedQuery<FtapSearchQuery>,
) -> ReferenceDataResult<Json<Page<FacilityTypeApprovedProduct>>> {
    let page = query.page_request();
    let params = FtapSearchParams::try_from(query).inspect_err(|error| {
        SearchMetrics::record_search(SearchOutcome::Invalid, 0, 0);
        tracing::warn!(error = %error, "Approved product search rejected");
    })?;

    let result = service.search(&params, &page).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_are_split_and_trimmed() {
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();
        let params = FtapSearchParams::try_from(FtapSearchQuery {
            facility_type: vec![" health_center, ,district_store".to_string()],
            orderable_id: vec![format!("{first}, {second},")],
            ..FtapSearchQuery::default()
        })
        .unwrap();

        assert_eq!(
            params.facility,
            Some(FacilityReference::FacilityTypeCodes(vec![
                "health_center".to_string(),
                "district_store".to_string()
            ]))
        );
        assert_eq!(params.orderable_ids, vec![first, second]);
        assert_eq!(params.active, None);
    }

    #[test]
    fn test_repeated_and_comma_separated_lists_combine() {
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();
        let third = Uuid::now_v7();
        let params = FtapSearchParams::try_from(FtapSearchQuery {
            facility_type: vec![
                "health_center".to_string(),
                "district_store,warehouse".to_string(),
            ],
            orderable_id: vec![format!("{first},{second}"), third.to_string()],
            ..FtapSearchQuery::default()
        })
        .unwrap();

        assert_eq!(
            params.facility,
            Some(FacilityReference::FacilityTypeCodes(vec![
                "health_center".to_string(),
                "district_store".to_string(),
                "warehouse".to_string()
            ]))
        );
        assert_eq!(params.orderable_ids, vec![first, second, third]);
    }

    #[test]
    fn test_facility_and_facility_type_conflict() {
        let error = FtapSearchParams::try_from(FtapSearchQuery {
            facility: Some(Uuid::now_v7()),
            facility_type: vec!["health_center".to_string()],
            ..FtapSearchQuery::default()
        })
        .unwrap_err();

        assert_eq!(
            error.message_key(),
            Some(MessageKey::FacilityAndFacilityTypeMutuallyExclusive)
        );
    }

    #[test]
    fn test_blank_facility_type_does_not_conflict() {
        let facility = Uuid::now_v7();
        let params = FtapSearchParams::try_from(FtapSearchQuery {
            facility: Some(facility),
            facility_type: vec![" , ".to_string(), String::new()],
            program_code: Some("  ".to_string()),
            ..FtapSearchQuery::default()
        })
        .unwrap();

        assert_eq!(params.facility, Some(FacilityReference::Facility(facility)));
        assert_eq!(params.program, None);
    }

    #[test]
    fn test_program_and_program_code_conflict() {
        let error = FtapSearchParams::try_from(FtapSearchQuery {
            program: Some(Uuid::now_v7()),
            program_code: Some("EPI".to_string()),
            ..FtapSearchQuery::default()
        })
        .unwrap_err();

        assert_eq!(
            error.message_key(),
            Some(MessageKey::ProgramAndProgramCodeMutuallyExclusive)
        );
    }

    #[test]
    fn test_invalid_orderable_id_names_the_offender() {
        let error = FtapSearchParams::try_from(FtapSearchQuery {
            orderable_id: vec![Uuid::now_v7().to_string(), "not-a-uuid".to_string()],
            ..FtapSearchQuery::default()
        })
        .unwrap_err();

        match error {
            ReferenceDataError::Validation { key, details } => {
                assert_eq!(key, MessageKey::OrderableIdInvalid);
                assert_eq!(details, "not-a-uuid");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_page_request_defaults() {
        assert_eq!(FtapSearchQuery::default().page_request(), PageRequest::unpaged());

        let query = FtapSearchQuery {
            page: Some(2),
            size: Some(25),
            ..FtapSearchQuery::default()
        };
        assert_eq!(query.page_request(), PageRequest::of(2, 25));
    }

    #[tokio::test]
    async fn test_rejected_search_is_counted_as_invalid() {
        use crate::repository::InMemoryFtapRepository;
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        observability::init_metrics();
        let app = router(FtapSearchService::new(InMemoryFtapRepository::new()));

        let uri = format!(
            "/facilityTypeApprovedProducts?program={}&programCode=EPI",
            Uuid::now_v7()
        );
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let rendered = observability::metrics_handler().await;
        assert!(rendered.contains(r#"referencedata_search_total{outcome="invalid"}"#));
    }

    #[test]
    fn test_openapi_documents_search_path() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/facilityTypeApprovedProducts"));
    }
}
