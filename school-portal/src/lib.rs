pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use config::Settings;
use services::{IdentityClient, RazorpayClient, RecordsClient};
use std::sync::Arc;
use std::time::Duration;

/// Outbound calls to the provider and the gateway give up after this long.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared application state. Everything in it is read-only and cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub identity: IdentityClient,
    pub records: RecordsClient,
    pub razorpay: RazorpayClient,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .user_agent(concat!("school-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let identity = IdentityClient::new(http.clone(), &settings.provider);
        let records = RecordsClient::new(http.clone(), &settings.provider);
        let razorpay = RazorpayClient::new(http, settings.razorpay.clone());

        Ok(Self {
            settings: Arc::new(settings),
            identity,
            records,
            razorpay,
        })
    }
}
