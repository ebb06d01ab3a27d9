#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use school_portal::config::{
    DatabaseSettings, ProviderSettings, RazorpaySettings, ServerSettings, Settings,
    TelemetrySettings,
};
use school_portal::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANON_KEY: &str = "test-anon-key";
pub const RAZORPAY_KEY_ID: &str = "rzp_test_key";
pub const RAZORPAY_KEY_SECRET: &str = "rzp_test_secret";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: MockServer,
    pub razorpay: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let provider = MockServer::start().await;
        let razorpay = MockServer::start().await;

        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                secure_cookies: false,
            },
            provider: ProviderSettings {
                url: provider.uri(),
                anon_key: Secret::new(ANON_KEY.to_string()),
            },
            database: DatabaseSettings::default(),
            razorpay: RazorpaySettings {
                key_id: RAZORPAY_KEY_ID.to_string(),
                key_secret: Secret::new(RAZORPAY_KEY_SECRET.to_string()),
                api_base_url: razorpay.uri(),
                currency: "INR".to_string(),
            },
            telemetry: TelemetrySettings::default(),
        };

        let app = Application::build(settings)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        // Wait for the server to accept connections
        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Self {
            address,
            port,
            provider,
            razorpay,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_action(&self, action: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut request = self
            .client
            .post(self.url(&format!("/actions/{}", action)))
            .json(&body);
        if let Some(token) = token {
            request = request.header("Cookie", session_cookie(token));
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn get_page(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }
        request.send().await.expect("Failed to execute request")
    }

    /// The provider accepts `token` as belonging to `user_id`.
    pub async fn mock_user(&self, token: &str, user_id: &str, email: &str) {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": user_id,
                "email": email,
                "role": "authenticated",
                "created_at": "2024-06-01T09:00:00Z"
            })))
            .mount(&self.provider)
            .await;
    }

    /// The `users` row for `user_id` carries `role`.
    pub async fn mock_user_row(&self, user_id: &str, email: &str, role: &str) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", format!("eq.{}", user_id).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": user_id,
                "email": email,
                "full_name": null,
                "role": role,
                "created_at": "2024-06-01T09:00:00Z"
            }])))
            .mount(&self.provider)
            .await;
    }
}

/// Unsigned JWT whose payload carries `sub` and `exp`.
pub fn fake_jwt(sub: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({ "sub": sub, "exp": exp, "role": "authenticated" }).to_string(),
    );
    format!("{}.{}.signature", header, payload)
}

/// Access token that stays valid well past the refresh margin.
pub fn long_lived_token(sub: &str) -> String {
    fake_jwt(sub, time::OffsetDateTime::now_utc().unix_timestamp() + 3600)
}

pub fn session_cookie(access_token: &str) -> String {
    format!(
        "sb-access-token={}; sb-refresh-token=refresh-{}",
        access_token, access_token.len()
    )
}
