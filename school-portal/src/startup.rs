//! Router assembly and server lifecycle.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::handlers::{actions, app, auth, dashboard, fees, metrics};
use crate::middleware::refresh_session_middleware;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let dashboard_routes = Router::new()
        .route("/dashboard", get(dashboard::overview))
        .route("/dashboard/fees", get(dashboard::fees_page))
        .route("/dashboard/settings", get(dashboard::settings_page))
        .route("/dashboard/admin/users", get(dashboard::admin_users_page));

    let action_routes = Router::new()
        .route("/actions/update-password", post(actions::update_password))
        .route("/actions/delete-user", post(actions::delete_user))
        .route(
            "/actions/create-payment-session",
            post(actions::create_payment_session),
        );

    Router::new()
        .route("/", get(app::index))
        .route("/health", get(app::health_check))
        .route("/ready", get(app::readiness_check))
        .route("/metrics", get(metrics::metrics))
        .route("/auth", get(auth::auth_page))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/api/fees/order", post(fees::create_order))
        .route("/api/fees/verify", post(fees::verify_payment))
        .merge(dashboard_routes)
        .merge(action_routes)
        .layer(from_fn_with_state(
            state.clone(),
            refresh_session_middleware,
        ))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application and bind its listener (port 0 picks a free port).
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
            .parse()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid server address: {}", e))
            })?;

        let state = AppState::new(settings)?;

        if state.razorpay.is_configured() {
            tracing::info!("Razorpay client initialized");
        } else {
            tracing::warn!("Razorpay credentials not configured - fee payments will fail");
        }

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("School portal listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DatabaseSettings, ProviderSettings, RazorpaySettings, ServerSettings, TelemetrySettings,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use secrecy::Secret;
    use tower::ServiceExt;

    /// Router whose upstreams are never reached by these tests.
    fn router() -> Router {
        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                secure_cookies: false,
            },
            provider: ProviderSettings {
                url: "http://127.0.0.1:9".to_string(),
                anon_key: Secret::new("anon".to_string()),
            },
            database: DatabaseSettings::default(),
            razorpay: RazorpaySettings {
                key_id: String::new(),
                key_secret: Secret::new(String::new()),
                api_base_url: "http://127.0.0.1:9".to_string(),
                currency: "INR".to_string(),
            },
            telemetry: TelemetrySettings::default(),
        };
        build_router(AppState::new(settings).unwrap())
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_service_and_version() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["service"], "school-portal");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn dashboard_without_cookies_redirects() {
        let response = router()
            .oneshot(Request::builder().uri("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth");
    }

    #[tokio::test]
    async fn action_without_cookies_is_unauthorized() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/actions/delete-user")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"userId":"u2"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not authenticated");
    }

    #[tokio::test]
    async fn malformed_action_body_uses_action_shape() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/actions/update-password")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::COOKIE, "sb-access-token=token")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn session_is_checked_before_the_body() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/actions/update-password")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"password":"abc"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Not authenticated");
    }

    #[tokio::test]
    async fn unconfigured_gateway_fails_with_msg() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/fees/order")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"amount":100}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["msg"], "Razorpay credentials not configured");
    }

    #[tokio::test]
    async fn api_routes_get_strict_csp() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/fees/order")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"amount":0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let csp = response.headers()[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap();
        assert!(csp.starts_with("default-src 'none'"));
    }
}
