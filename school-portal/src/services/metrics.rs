use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
    }
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count a fee order attempt by outcome (`created`, `rejected`, `failed`).
pub fn record_fee_order(source: &'static str, outcome: &'static str) {
    counter!("fee_orders_total", "source" => source, "outcome" => outcome).increment(1);
}

/// Count a server action invocation by outcome (`ok`, `failed`, `denied`, `rejected`).
pub fn record_action(action: &'static str, outcome: &'static str) {
    counter!("portal_actions_total", "action" => action, "outcome" => outcome).increment(1);
}
