//! Balance aggregation and health endpoint tests.

mod common;

use rust_decimal::Decimal;

use biocoin_api::blockchain::{Chain, ChainError, ChainRegistry};
use biocoin_api::http::X_REQUEST_ID;
use common::{http_client, start_server, test_config, SpyAdapter, SpyMode};

#[tokio::test]
async fn test_balances_isolate_chain_failures() {
    let solana = SpyAdapter::new(Chain::Solana, SpyMode::Succeed(Decimal::new(15, 1)));
    let bsc = SpyAdapter::new(
        Chain::Bsc,
        SpyMode::Fail(ChainError::Connection("All RPC providers failed to read balance".into())),
    );
    let registry = ChainRegistry::new().with(solana.clone()).with(bsc.clone());
    let server = start_server(test_config(), registry).await;

    let resp = server.client().balances().await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["success"], true);
    assert_eq!(resp.body["balances"]["solana"], 1.5);
    assert!(resp.body["balances"]["bsc"]["error"]
        .as_str()
        .unwrap()
        .contains("All RPC providers failed"));
    assert_eq!(solana.balance_calls(), 1);
    assert_eq!(bsc.balance_calls(), 1);
    server.stop().await;
}

#[tokio::test]
async fn test_balances_survive_adapter_panic() {
    let solana = SpyAdapter::new(Chain::Solana, SpyMode::Panic);
    let bsc = SpyAdapter::new(Chain::Bsc, SpyMode::Succeed(Decimal::from(42)));
    let registry = ChainRegistry::new().with(solana).with(bsc);
    let server = start_server(test_config(), registry).await;

    let resp = server.client().balances().await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["balances"]["bsc"], 42.0);
    assert!(resp.body["balances"]["solana"]["error"].is_string());
    server.stop().await;
}

#[tokio::test]
async fn test_balances_only_for_registered_wallets() {
    let solana = SpyAdapter::new(Chain::Solana, SpyMode::Succeed(Decimal::ONE));
    let bsc = SpyAdapter::new(Chain::Bsc, SpyMode::Succeed(Decimal::ONE));
    let registry = ChainRegistry::new().with(solana.clone()).with(bsc.clone());
    let mut config = test_config();
    config.auth.users[0].wallets.bsc = None;
    let server = start_server(config, registry).await;

    let resp = server.client().balances().await.unwrap();

    let balances = resp.body["balances"].as_object().unwrap();
    assert_eq!(balances.len(), 1);
    assert!(balances.contains_key("solana"));
    assert_eq!(bsc.balance_calls(), 0);
    server.stop().await;
}

#[tokio::test]
async fn test_balances_require_auth() {
    let server = start_server(test_config(), ChainRegistry::new()).await;

    let resp = server.anonymous_client().balances().await.unwrap();

    assert_eq!(resp.status, 401);
    server.stop().await;
}

#[tokio::test]
async fn test_health_endpoints() {
    let solana = SpyAdapter::new(Chain::Solana, SpyMode::Succeed(Decimal::ZERO));
    let registry = ChainRegistry::new().with(solana);
    let server = start_server(test_config(), registry).await;
    let client = server.anonymous_client();

    let resp = client.health().await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["status"], "ok");
    assert_eq!(resp.body["service"], "BioCoin API");

    let resp = client.health_detailed().await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["status"], "ok");
    assert_eq!(resp.body["environment"], "development");
    assert_eq!(resp.body["chains"]["solana"]["configured"], true);
    assert_eq!(resp.body["chains"]["solana"]["healthy"], true);
    assert_eq!(resp.body["chains"]["bsc"]["configured"], false);
    server.stop().await;
}

#[tokio::test]
async fn test_detailed_health_reports_degraded_chain() {
    let bsc = SpyAdapter::new(Chain::Bsc, SpyMode::Fail(ChainError::Connection("down".into())));
    let registry = ChainRegistry::new().with(bsc);
    let server = start_server(test_config(), registry).await;

    let resp = server.anonymous_client().health_detailed().await.unwrap();

    assert_eq!(resp.body["status"], "degraded");
    assert_eq!(resp.body["chains"]["bsc"]["healthy"], false);
    server.stop().await;
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let server = start_server(test_config(), ChainRegistry::new()).await;
    let client = http_client();

    let resp = client.get(format!("{}/", server.url())).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let generated = resp.headers().get(X_REQUEST_ID).unwrap().to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let resp = client
        .get(format!("{}/health", server.url()))
        .header(X_REQUEST_ID, "trace-abc")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()[X_REQUEST_ID], "trace-abc");
    server.stop().await;
}
