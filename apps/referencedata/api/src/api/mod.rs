use axum::{
    Router,
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use domain_referencedata::{FtapSearchService, PgFtapRepository, handlers};
use observability::middleware::metrics_middleware;
use sea_orm::DatabaseConnection;

/// API routes without the `/api` prefix, which `create_router` adds.
///
/// HTTP metrics are recorded per matched route, so the layer sits here rather
/// than on the outer router where no route has matched yet.
pub fn routes(db: &DatabaseConnection) -> Router {
    let repository = PgFtapRepository::new(db.clone());
    handlers::router(FtapSearchService::new(repository))
        .route_layer(middleware::from_fn(metrics_middleware))
}

/// `/ready` with a real database check, plus `/metrics`.
pub fn operational_router(db: DatabaseConnection) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .with_state(db)
        .route("/metrics", get(observability::metrics_handler))
}

async fn ready_handler(State(db): State<DatabaseConnection>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "database",
        Box::pin(async {
            database::postgres::check_health(&db)
                .await
                .map_err(|e| e.to_string())
        }),
    )];

    run_health_checks(checks).await.into_response()
}
