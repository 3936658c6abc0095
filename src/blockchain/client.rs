//! EVM JSON-RPC client with timeout and failover, used by the BSC adapter.
//!
//! # Responsibilities
//! - Connect to the primary JSON-RPC endpoint and any failovers
//! - Query chain state (chain id, block number, gas price, token balances)
//! - Handle timeouts and network errors gracefully
//! - Provide health check for blockchain connectivity

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use alloy::contract::Error as ContractError;
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use alloy::transports::TransportError;
use tokio::time::timeout;

use crate::blockchain::transaction::{classify_contract_error, classify_transport_error};
use crate::blockchain::types::{BlockchainResult, Chain, ChainError};
use crate::config::ChainConfig;

sol! {
    /// BioCoin BEP-20 token with the data-access payment extension.
    #[sol(rpc)]
    interface IBioCoin {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address recipient, uint256 amount) external returns (bool);
        function payForDataAccess(address dataProvider, uint256 amount) external returns (bool);
    }
}

/// A provider call failure, split by whether the node ever answered.
pub(crate) trait RpcFailure: Display {
    /// The request never got an answer, so another provider may succeed.
    fn is_unreachable(&self) -> bool;

    fn into_chain_error(self) -> ChainError;
}

impl RpcFailure for TransportError {
    fn is_unreachable(&self) -> bool {
        self.is_transport_error()
    }

    fn into_chain_error(self) -> ChainError {
        classify_transport_error(self)
    }
}

impl RpcFailure for ContractError {
    fn is_unreachable(&self) -> bool {
        matches!(self, ContractError::TransportError(e) if e.is_transport_error())
    }

    fn into_chain_error(self) -> ChainError {
        classify_contract_error(self)
    }
}

/// EVM RPC client wrapper with failover support.
#[derive(Clone)]
pub struct EvmClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Primary endpoint, used for signing providers.
    primary_url: url::Url,
    config: ChainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl EvmClient {
    /// Create a new client and verify the remote chain id.
    ///
    /// An unreachable endpoint or a chain id mismatch is logged but does not
    /// fail construction; reads fail individually until the node recovers.
    pub async fn new(config: &ChainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let rpc_url = config.effective_rpc_url(Chain::Bsc);

        let primary_url: url::Url = rpc_url.parse().map_err(|e| {
            ChainError::Connection(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;
        let mut providers = vec![ProviderBuilder::new().connect_http(primary_url.clone()).erased()];

        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(ProviderBuilder::new().connect_http(url).erased()),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let client = Self {
            providers,
            primary_url,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => tracing::info!(
                rpc_url = %rpc_url,
                chain_id = config.chain_id,
                "BSC client initialized"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "BSC client initialized but chain verification failed"
            ),
        }

        Ok(client)
    }

    /// Run `op` against each provider in turn until one answers in time.
    ///
    /// Only unreachable providers and timeouts move on to the next one. An
    /// error response or revert from a node that answered is returned as is.
    async fn with_failover<T, E, F, Fut>(&self, what: &str, op: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RpcFailure,
    {
        let mut last_error = String::from("no providers configured");
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, op(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) if e.is_unreachable() => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC node refused {}", what);
                    return Err(e.into_chain_error());
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                    last_error = format!("timed out after {} seconds", self.timeout_duration.as_secs());
                }
            }
        }
        Err(ChainError::Connection(format!(
            "All RPC providers failed to {}: {}",
            what, last_error
        )))
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id != self.config.chain_id {
            return Err(ChainError::NotAvailable(format!(
                "Chain ID mismatch: expected {}, got {}",
                self.config.chain_id, chain_id
            )));
        }
        Ok(())
    }

    pub async fn get_chain_id(&self) -> BlockchainResult<u64> {
        self.with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
    }

    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.with_failover("get gas price", |p| async move { p.get_gas_price().await })
            .await
    }

    /// BEP-20 balance of `owner` in the token's smallest unit.
    pub async fn token_balance(&self, token: Address, owner: Address) -> BlockchainResult<U256> {
        self.with_failover("get token balance", |p| async move {
            IBioCoin::new(token, p).balanceOf(owner).call().await
        })
        .await
    }

    /// Check if the chain is reachable; true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        self.get_block_number().await.is_ok()
    }

    /// Primary endpoint, for building signing providers.
    pub fn primary_url(&self) -> &url::Url {
        &self.primary_url
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout_duration
    }
}

impl std::fmt::Debug for EvmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmClient")
            .field("rpc_url", &self.primary_url.as_str())
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
