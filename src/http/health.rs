//! Liveness and readiness endpoints.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{json, Value};

use crate::blockchain::Chain;
use crate::http::server::AppState;
use crate::payments::types::iso_timestamp;

const SERVICE_NAME: &str = "BioCoin API";

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to BioCoin API" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": iso_timestamp(),
        "service": SERVICE_NAME,
    }))
}

#[derive(Debug, Serialize)]
pub struct ChainStatus {
    pub configured: bool,
    pub healthy: bool,
}

#[derive(Debug, Serialize)]
pub struct DetailedHealth {
    /// `ok`, or `degraded` when a configured chain is unreachable.
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub version: &'static str,
    /// Seconds since startup.
    pub uptime: u64,
    pub environment: &'static str,
    pub chains: BTreeMap<Chain, ChainStatus>,
}

pub async fn detailed(State(state): State<AppState>) -> Json<DetailedHealth> {
    let checks = Chain::ALL.into_iter().map(|chain| {
        let adapter = state.registry.get(chain).cloned();
        async move {
            let status = match adapter {
                Some(adapter) => ChainStatus {
                    configured: true,
                    healthy: adapter.is_healthy().await,
                },
                None => ChainStatus {
                    configured: false,
                    healthy: false,
                },
            };
            (chain, status)
        }
    });
    let chains: BTreeMap<_, _> = join_all(checks).await.into_iter().collect();

    let degraded = chains.values().any(|s| s.configured && !s.healthy);

    Json(DetailedHealth {
        status: if degraded { "degraded" } else { "ok" },
        timestamp: iso_timestamp(),
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        environment: state.config.environment.as_str(),
        chains,
    })
}
