//! Prometheus metrics for the reference-data service.
//!
//! - [`init_metrics`] installs the global recorder once per process.
//! - [`metrics_handler`] renders the text exposition for `/metrics`.
//! - [`middleware::metrics_middleware`] records per-route HTTP counters and latencies.
//! - [`SearchMetrics`] times the stages of an approved-product search.
//!
//! ```rust,ignore
//! use axum::{Router, middleware, routing::get};
//! use observability::{init_metrics, metrics_handler, middleware::metrics_middleware};
//!
//! init_metrics();
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler))
//!     .layer(middleware::from_fn(metrics_middleware));
//! ```

pub mod middleware;
pub mod search;

pub use search::{SearchMetrics, SearchOutcome, SearchStage, StageTimer};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{error, info};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Later calls return the first handle.
///
/// If another recorder already owns the global slot, metrics are rendered
/// from a detached recorder and nothing recorded through the macros shows up.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_metric_descriptions();
            info!("Prometheus metrics recorder initialized");
            handle
        }
        Err(e) => {
            error!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
            PrometheusBuilder::new().build_recorder().handle()
        }
    })
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for `/metrics`.
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP requests answered with 4xx or 5xx"
    );

    search::describe();
}
