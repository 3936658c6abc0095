//! Solana adapter: JSON-RPC balance reads and simulated data-access payments.
//!
//! # Responsibilities
//! - Query lamport balances over JSON-RPC with failover across endpoints
//! - Validate base58 addresses before any network call
//! - Settle payments in simulated mode (no program invocation)

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::blockchain::adapter::ChainAdapter;
use crate::blockchain::types::{
    from_base_units, to_base_units, validate_address, BlockchainResult, Chain, ChainError,
};
use crate::config::ChainConfig;
use crate::observability::metrics;
use crate::payments::types::{PayerInfo, PaymentResult};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC "invalid params"; for `getBalance` this means a bad pubkey.
const INVALID_PARAMS: i64 = -32602;

impl RpcErrorObject {
    /// The node answered and refused the call; not retryable.
    fn rejection(&self, method: &str) -> ChainError {
        ChainError::TransactionRejected(format!(
            "{} failed: {} (code {})",
            method, self.message, self.code
        ))
    }
}

#[derive(Debug, Deserialize)]
struct BalanceValue {
    value: u64,
}

/// Minimal Solana JSON-RPC client with endpoint failover.
#[derive(Clone)]
pub struct SolanaRpcClient {
    /// Primary endpoint followed by failovers.
    urls: Vec<String>,
    http: reqwest::Client,
}

impl SolanaRpcClient {
    pub fn new(config: &ChainConfig) -> BlockchainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .build()
            .map_err(|e| ChainError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        let mut urls = vec![config.effective_rpc_url(Chain::Solana)];
        urls.extend(config.failover_urls.iter().cloned());

        Ok(Self { urls, http })
    }

    /// Call `method`, trying each endpoint until one answers.
    ///
    /// An error object from a node that answered is a rejection and is not
    /// retried elsewhere; only unreachable or garbled endpoints fail over.
    pub async fn call(&self, method: &str, params: Value) -> BlockchainResult<Value> {
        self.request(method, params)
            .await?
            .map_err(|err| err.rejection(method))
    }

    /// Outer error: no endpoint answered. Inner error: the node's error object.
    async fn request(
        &self,
        method: &str,
        params: Value,
    ) -> BlockchainResult<Result<Value, RpcErrorObject>> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let mut last_error = String::from("no endpoints configured");

        for (i, url) in self.urls.iter().enumerate() {
            let response = match self.http.post(url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(provider_idx = i, method, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                tracing::warn!(provider_idx = i, method, status = %status, "RPC endpoint returned error status");
                last_error = format!("HTTP {}", status);
                continue;
            }

            let parsed: RpcResponse = match response.json().await {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(provider_idx = i, method, error = %e, "Malformed RPC response");
                    last_error = e.to_string();
                    continue;
                }
            };

            match (parsed.result, parsed.error) {
                (_, Some(err)) => {
                    tracing::warn!(provider_idx = i, method, code = err.code, message = %err.message, "RPC node rejected call");
                    return Ok(Err(err));
                }
                (Some(result), None) => return Ok(Ok(result)),
                (None, None) => {
                    tracing::warn!(provider_idx = i, method, "RPC response had no result");
                    last_error = format!("{} returned no result", method);
                }
            }
        }

        Err(ChainError::Connection(format!(
            "All RPC providers failed for {}: {}",
            method, last_error
        )))
    }

    /// Balance in lamports.
    pub async fn get_balance(&self, address: &str) -> BlockchainResult<u64> {
        let result = self
            .request("getBalance", json!([address]))
            .await?
            .map_err(|err| match err.code {
                INVALID_PARAMS => ChainError::InvalidAddress {
                    chain: Chain::Solana,
                    address: address.to_string(),
                    reason: err.message,
                },
                _ => err.rejection("getBalance"),
            })?;
        let balance: BalanceValue = serde_json::from_value(result)
            .map_err(|e| ChainError::NotAvailable(format!("Unexpected getBalance result: {}", e)))?;
        Ok(balance.value)
    }

    /// Whether the node reports itself healthy.
    pub async fn get_health(&self) -> BlockchainResult<bool> {
        let result = self.call("getHealth", json!([])).await?;
        Ok(result.as_str() == Some("ok"))
    }
}

impl std::fmt::Debug for SolanaRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpcClient")
            .field("urls", &self.urls)
            .finish()
    }
}

/// Adapter for the Solana network.
#[derive(Debug, Clone)]
pub struct SolanaAdapter {
    client: SolanaRpcClient,
    program_id: Option<String>,
}

impl SolanaAdapter {
    pub fn new(config: &ChainConfig) -> BlockchainResult<Self> {
        let client = SolanaRpcClient::new(config)?;
        let program_id = Some(config.contract_id.clone()).filter(|id| !id.is_empty());

        tracing::info!(
            rpc_url = %config.effective_rpc_url(Chain::Solana),
            program_id = program_id.as_deref().unwrap_or("unset"),
            "Solana adapter initialized"
        );

        Ok(Self { client, program_id })
    }

    fn settle(&self, payer: &PayerInfo, payee: &str, amount: Decimal) -> BlockchainResult<String> {
        validate_address(Chain::Solana, &payer.wallet_address)?;
        validate_address(Chain::Solana, payee)?;
        if amount <= Decimal::ZERO {
            return Err(ChainError::InvalidAmount(format!("{} must be positive", amount)));
        }
        let lamports = to_base_units(amount, Chain::Solana.decimals())?;

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let tx_id = format!("sol_{}_{}", Utc::now().timestamp_millis(), &suffix[..8]);

        tracing::info!(
            payer = %payer.wallet_address,
            provider = %payee,
            lamports = %lamports,
            program_id = self.program_id.as_deref().unwrap_or("unset"),
            tx_id = %tx_id,
            "Simulated Solana payment"
        );
        Ok(tx_id)
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    async fn get_balance(&self, address: &str) -> BlockchainResult<Decimal> {
        validate_address(Chain::Solana, address)?;
        let lamports = self.client.get_balance(address).await.inspect_err(|e| {
            tracing::error!(error = %e, wallet = %address, "Failed to get Solana balance");
        })?;
        from_base_units(lamports as u128, Chain::Solana.decimals())
    }

    async fn submit_payment(&self, payer: &PayerInfo, payee: &str, amount: Decimal) -> PaymentResult {
        match self.settle(payer, payee, amount) {
            Ok(tx_id) => PaymentResult::confirmed(tx_id, amount),
            Err(e) => {
                tracing::warn!(error = %e, payer = %payer.wallet_address, provider = %payee, "Solana payment rejected");
                PaymentResult::failed(amount, &e)
            }
        }
    }

    async fn is_healthy(&self) -> bool {
        let healthy = matches!(self.client.get_health().await, Ok(true));
        metrics::record_chain_health(Chain::Solana, healthy);
        healthy
    }
}
