use askama::Template;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::middleware::ScopedClient;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub viewer_email: Option<String>,
}

/// Public home page. The navigation adapts to whether a session is present.
pub async fn index(client: ScopedClient) -> impl IntoResponse {
    let viewer_email = match client.current_user().await {
        Ok(user) => user.map(|u| u.display_email()),
        Err(e) => {
            tracing::warn!(error = %e, "Could not resolve viewer for home page");
            None
        }
    };

    IndexTemplate { viewer_email }
}

/// Health check endpoint for liveness probes.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "school-portal",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

pub async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}
