use axum::http::{HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

/// CORS for the read-only API: GET and OPTIONS from an explicit origin list.
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Parse a comma-separated origin list such as `http://localhost:3000,https://lmis.example.org`.
pub fn parse_allowed_origins(raw: &str) -> io::Result<Vec<HeaderValue>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HeaderValue>().map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid CORS_ALLOWED_ORIGIN value '{s}': {e}"),
                )
            })
        })
        .collect()
}

/// CORS layer from `CORS_ALLOWED_ORIGIN`, or `None` when the variable is unset or empty.
///
/// Without it the API only serves same-origin and server-to-server callers.
pub fn cors_layer_from_env() -> io::Result<Option<CorsLayer>> {
    let Ok(raw) = std::env::var("CORS_ALLOWED_ORIGIN") else {
        info!("CORS_ALLOWED_ORIGIN not set, CORS disabled");
        return Ok(None);
    };

    let origins = parse_allowed_origins(&raw)?;
    if origins.is_empty() {
        info!("CORS_ALLOWED_ORIGIN empty, CORS disabled");
        return Ok(None);
    }

    info!(origins = %raw, "CORS configured");
    Ok(Some(create_cors_layer(origins)))
}
