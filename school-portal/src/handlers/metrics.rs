use axum::{http::header, response::IntoResponse};

/// Prometheus metrics endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        crate::services::get_metrics(),
    )
}
