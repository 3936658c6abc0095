//! Metrics collection and exposition.
//!
//! # Metrics
//! - `biocoin_http_requests_total` (counter): requests by method, status
//! - `biocoin_http_request_duration_seconds` (histogram): latency distribution
//! - `biocoin_payments_total` (counter): payments by chain, outcome
//! - `biocoin_balance_queries_total` (counter): balance lookups by chain, outcome
//! - `biocoin_chain_health` (gauge): 1=healthy, 0=unhealthy
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::blockchain::Chain;

/// Install the Prometheus exporter and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!(
        "biocoin_http_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "biocoin_http_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

pub fn record_payment(chain: Chain, success: bool) {
    counter!(
        "biocoin_payments_total",
        "chain" => chain.as_str(),
        "outcome" => outcome(success)
    )
    .increment(1);
}

pub fn record_balance_query(chain: Chain, success: bool) {
    counter!(
        "biocoin_balance_queries_total",
        "chain" => chain.as_str(),
        "outcome" => outcome(success)
    )
    .increment(1);
}

pub fn record_chain_health(chain: Chain, healthy: bool) {
    gauge!("biocoin_chain_health", "chain" => chain.as_str()).set(if healthy { 1.0 } else { 0.0 });
}
