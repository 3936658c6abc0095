//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use biocoin_api::blockchain::{BlockchainResult, Chain, ChainAdapter, ChainError, ChainRegistry};
use biocoin_api::config::{AppConfig, UserConfig, WalletMap};
use biocoin_api::http::HttpServer;
use biocoin_api::lifecycle::Shutdown;
use biocoin_api::payments::{Credential, PayerInfo, PaymentResult, TransactionLedger};
use biocoin_sdk::BiocoinClient;

pub const API_KEY: &str = "test-api-key";
pub const USER_ID: &str = "user123";

pub const PAYER_SOLANA: &str = "So11111111111111111111111111111111111111112";
pub const PROVIDER_SOLANA: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const PAYER_BSC: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const PROVIDER_BSC: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// How a [`SpyAdapter`] answers.
#[derive(Debug, Clone)]
pub enum SpyMode {
    Succeed(Decimal),
    Fail(ChainError),
    Panic,
}

/// Adapter that records how often it was called.
pub struct SpyAdapter {
    chain: Chain,
    mode: SpyMode,
    pub payments: AtomicUsize,
    pub balance_queries: AtomicUsize,
}

impl SpyAdapter {
    pub fn new(chain: Chain, mode: SpyMode) -> Arc<Self> {
        Arc::new(Self {
            chain,
            mode,
            payments: AtomicUsize::new(0),
            balance_queries: AtomicUsize::new(0),
        })
    }

    pub fn payment_calls(&self) -> usize {
        self.payments.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainAdapter for SpyAdapter {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn get_balance(&self, _address: &str) -> BlockchainResult<Decimal> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            SpyMode::Succeed(balance) => Ok(*balance),
            SpyMode::Fail(e) => Err(e.clone()),
            SpyMode::Panic => panic!("spy adapter panic"),
        }
    }

    async fn submit_payment(&self, _payer: &PayerInfo, _payee: &str, amount: Decimal) -> PaymentResult {
        let n = self.payments.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            SpyMode::Succeed(_) => PaymentResult::confirmed(format!("{}_spy_{}", self.chain, n), amount),
            SpyMode::Fail(e) => PaymentResult::failed(amount, e),
            SpyMode::Panic => panic!("spy adapter panic"),
        }
    }

    async fn is_healthy(&self) -> bool {
        !matches!(self.mode, SpyMode::Fail(_))
    }
}

/// Config with one user holding wallets on both chains and a default provider
/// that can receive on both chains.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.auth.users.push(UserConfig {
        id: USER_ID.to_string(),
        api_key: API_KEY.to_string(),
        wallets: WalletMap {
            solana: Some(PAYER_SOLANA.to_string()),
            bsc: Some(PAYER_BSC.to_string()),
        },
    });
    config.catalog.default_provider.wallets = WalletMap {
        solana: Some(PROVIDER_SOLANA.to_string()),
        bsc: Some(PROVIDER_BSC.to_string()),
    };
    config
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub ledger: TransactionLedger,
    shutdown: Shutdown,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// SDK client authenticated as the test user.
    pub fn client(&self) -> BiocoinClient {
        self.anonymous_client().with_api_key(API_KEY)
    }

    pub fn anonymous_client(&self) -> BiocoinClient {
        BiocoinClient::new(&self.url()).with_http_client(http_client())
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Client that never goes through a system proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub async fn start_server(config: AppConfig, registry: ChainRegistry) -> TestServer {
    start_server_with_credentials(config, registry, HashMap::new()).await
}

pub async fn start_server_with_credentials(
    config: AppConfig,
    registry: ChainRegistry,
    credentials: HashMap<Chain, Credential>,
) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let ledger = TransactionLedger::new(None);
    let server = HttpServer::new(config, registry, ledger.clone(), credentials);
    let shutdown = Shutdown::new();
    let stop = shutdown.wait();

    let handle = tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    TestServer {
        addr,
        ledger,
        shutdown,
        handle,
    }
}

/// Start a raw-TCP HTTP backend that answers JSON-RPC posts.
///
/// `handler` receives the parsed request body and returns the JSON response
/// body, always sent with status 200.
pub async fn start_json_rpc_backend<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Some(body) = read_json_body(&mut socket).await {
                            let response = handler(body).await.to_string();
                            let response_str = format!(
                                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                response.len(),
                                response
                            );
                            let _ = socket.write_all(response_str.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read one HTTP request and parse its body as JSON.
async fn read_json_body(socket: &mut TcpStream) -> Option<Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = (header_end + content_length).min(buf.len());
    serde_json::from_slice(&buf[header_end..end]).ok()
}
