//! Prometheus metrics
//!
//! The recorder is installed once per process; the handle renders the
//! exposition text for `GET /metrics`.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::state::AppState;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder, returning the shared handle
///
/// Safe to call more than once; later calls return the first handle.
pub fn init_metrics() -> Option<PrometheusHandle> {
    let handle = HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe_metrics();
        Ok::<_, metrics_exporter_prometheus::BuildError>(handle)
    });

    match handle {
        Ok(handle) => Some(handle.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

fn describe_metrics() {
    metrics::describe_counter!("medibot_requests_total", "HTTP requests by route and status");
    metrics::describe_counter!(
        "medibot_dialogue_routes_total",
        "Messages handled per dialogue route"
    );
    metrics::describe_histogram!(
        "medibot_llm_latency_seconds",
        metrics::Unit::Seconds,
        "Language model completion latency"
    );
    metrics::describe_counter!("medibot_errors_total", "Failed requests by error kind");
}

/// Count one HTTP request
pub fn record_request(route: &str, status: u16) {
    metrics::counter!(
        "medibot_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Count one failed request
pub fn record_error(kind: &'static str) {
    metrics::counter!("medibot_errors_total", "kind" => kind).increment(1);
}

/// Prometheus exposition endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            "metrics disabled\n".to_string(),
        ),
    }
}
