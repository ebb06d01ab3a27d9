use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub razorpay: RazorpaySettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Mark session cookies `Secure`. Enable whenever the portal is served over HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Hosted auth/database provider. Identity lives under `/auth/v1`, tables under `/rest/v1`.
#[derive(Deserialize, Clone)]
pub struct ProviderSettings {
    pub url: String,
    /// Public (anon) key sent as `apikey` on every provider request.
    pub anon_key: Secret<String>,
}

/// Direct Postgres connection, only used by the `db-check` binary.
#[derive(Deserialize, Clone, Default)]
pub struct DatabaseSettings {
    pub url: Option<Secret<String>>,
}

#[derive(Deserialize, Clone)]
pub struct RazorpaySettings {
    pub key_id: String,
    pub key_secret: Secret<String>,
    #[serde(default = "default_razorpay_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_razorpay_api_base_url() -> String {
    "https://api.razorpay.com/v1".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info,school_portal=debug".to_string()
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let configuration_directory = service_core::config::config_dir("school-portal")?;
    service_core::config::load(&configuration_directory)
}
