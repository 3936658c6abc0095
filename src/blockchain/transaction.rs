//! Signed `payForDataAccess` submission on BSC.
//!
//! # Responsibilities
//! - Price gas against the configured cap and multiplier
//! - Estimate, sign and broadcast the token call
//! - Wait for the receipt and map node errors onto [`ChainError`]

use std::time::Duration;

use alloy::contract::Error as ContractError;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::ProviderBuilder;
use alloy::transports::TransportError;
use tokio::time::timeout;

use crate::blockchain::client::{EvmClient, IBioCoin};
use crate::blockchain::types::{BlockchainResult, ChainError};
use crate::blockchain::wallet::Wallet;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Transaction builder for token payments from one wallet.
pub struct TxBuilder {
    client: EvmClient,
    wallet: Wallet,
}

impl TxBuilder {
    pub fn new(client: EvmClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    /// Gas price to bid, in wei.
    pub async fn gas_price(&self) -> BlockchainResult<u128> {
        let gas_price = self.client.get_gas_price().await?;
        let config = self.client.config();
        adjust_gas_price(gas_price, config.max_gas_price_gwei, config.gas_price_multiplier)
    }

    /// Call `payForDataAccess(provider, amount)` on `token` and wait for the receipt.
    pub async fn pay_for_data_access(
        &self,
        token: Address,
        provider: Address,
        amount: U256,
    ) -> BlockchainResult<TxHash> {
        let gas_price = self.gas_price().await?;
        let rpc_timeout = self.client.timeout_duration();

        let signing_provider = ProviderBuilder::new()
            .wallet(self.wallet.ethereum_wallet())
            .connect_http(self.client.primary_url().clone());
        let contract = IBioCoin::new(token, signing_provider);

        let call = contract
            .payForDataAccess(provider, amount)
            .from(self.wallet.address());

        let gas_limit = timeout(rpc_timeout, call.estimate_gas())
            .await
            .map_err(|_| rpc_timed_out(rpc_timeout))?
            .map_err(classify_contract_error)?;

        let call = call.gas(gas_limit).gas_price(gas_price);
        let pending = timeout(rpc_timeout, call.send())
            .await
            .map_err(|_| rpc_timed_out(rpc_timeout))?
            .map_err(classify_contract_error)?;
        let tx_hash = *pending.tx_hash();

        tracing::info!(
            tx_hash = %tx_hash,
            from = %self.wallet.address(),
            provider = %provider,
            gas_limit,
            "BSC payment broadcast"
        );

        let confirmation = Duration::from_secs(self.client.config().confirmation_timeout_secs);
        let receipt = timeout(confirmation, pending.get_receipt())
            .await
            .map_err(|_| {
                ChainError::Connection(format!(
                    "No receipt for {} after {} seconds",
                    tx_hash,
                    confirmation.as_secs()
                ))
            })?
            .map_err(|e| ChainError::Connection(format!("Receipt for {} unavailable: {}", tx_hash, e)))?;

        if !receipt.status() {
            return Err(ChainError::TransactionRejected(format!(
                "Transaction {} reverted",
                tx_hash
            )));
        }
        Ok(receipt.transaction_hash)
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

/// Apply the safety multiplier after checking the node's price against the cap.
pub fn adjust_gas_price(gas_price: u128, max_gwei: u64, multiplier: f64) -> BlockchainResult<u128> {
    let gas_price_gwei = gas_price / WEI_PER_GWEI;
    if gas_price_gwei > max_gwei as u128 {
        return Err(ChainError::TransactionRejected(format!(
            "Gas price too high: {} gwei (max: {} gwei)",
            gas_price_gwei, max_gwei
        )));
    }
    Ok((gas_price as f64 * multiplier) as u128)
}

fn rpc_timed_out(duration: Duration) -> ChainError {
    ChainError::Connection(format!("RPC timeout after {} seconds", duration.as_secs()))
}

/// Map a contract call failure onto the payment error taxonomy.
pub fn classify_contract_error(err: ContractError) -> ChainError {
    match err {
        ContractError::TransportError(inner) => classify_transport_error(inner),
        other => ChainError::TransactionRejected(other.to_string()),
    }
}

pub(crate) fn classify_transport_error(err: TransportError) -> ChainError {
    if let Some(payload) = err.as_error_resp() {
        return classify_node_message(&payload.message);
    }
    if err.is_transport_error() {
        ChainError::Connection(err.to_string())
    } else {
        ChainError::TransactionRejected(err.to_string())
    }
}

/// Node error text to error kind.
pub fn classify_node_message(message: &str) -> ChainError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("insufficient funds") || lower.contains("exceeds balance") {
        ChainError::InsufficientFunds(message.to_string())
    } else {
        ChainError::TransactionRejected(message.to_string())
    }
}
