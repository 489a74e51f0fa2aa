use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reference Data API",
        version = "0.1.0",
        description = "Search over versioned facility type approved products"
    ),
    servers(
        (url = "/api", description = "API base path")
    )
)]
struct ApiInfo;

/// Service document: API info plus the domain paths and schemas.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        ApiInfo::openapi().merge_from(domain_referencedata::handlers::ApiDoc::openapi())
    }
}
