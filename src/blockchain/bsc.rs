//! BSC adapter: BioCoin BEP-20 balances and `payForDataAccess` settlement.

use async_trait::async_trait;
use alloy::primitives::{keccak256, U256};
use rust_decimal::Decimal;

use crate::blockchain::adapter::ChainAdapter;
use crate::blockchain::client::EvmClient;
use crate::blockchain::transaction::TxBuilder;
use crate::blockchain::types::{
    from_base_units, parse_evm_address, to_base_units, BlockchainResult, Chain, ChainError,
};
use crate::blockchain::wallet::Wallet;
use crate::config::{ChainConfig, Settlement};
use crate::observability::metrics;
use crate::payments::types::{PayerInfo, PaymentResult};

#[derive(Debug, Clone)]
pub struct BscAdapter {
    client: EvmClient,
    /// Token contract; reads and on-chain payments need it.
    contract: Option<alloy::primitives::Address>,
    settlement: Settlement,
}

impl BscAdapter {
    pub async fn new(config: &ChainConfig) -> BlockchainResult<Self> {
        let client = EvmClient::new(config).await?;
        let contract = if config.contract_id.is_empty() {
            None
        } else {
            Some(parse_evm_address(&config.contract_id)?)
        };

        tracing::info!(
            contract = contract.map(|c| c.to_string()).as_deref().unwrap_or("unset"),
            settlement = ?config.settlement,
            "BSC adapter initialized"
        );

        Ok(Self {
            client,
            contract,
            settlement: config.settlement,
        })
    }

    fn contract(&self) -> BlockchainResult<alloy::primitives::Address> {
        self.contract
            .ok_or_else(|| ChainError::NotAvailable("BioCoin contract address not configured".into()))
    }

    async fn settle(&self, payer: &PayerInfo, payee: &str, amount: Decimal) -> BlockchainResult<String> {
        let payer_address = parse_evm_address(&payer.wallet_address)?;
        let provider = parse_evm_address(payee)?;
        if amount <= Decimal::ZERO {
            return Err(ChainError::InvalidAmount(format!("{} must be positive", amount)));
        }
        let wei = to_base_units(amount, Chain::Bsc.decimals())?;

        match self.settlement {
            Settlement::Simulated => {
                let nonce = uuid::Uuid::new_v4();
                let preimage = format!("{}:{}:{}:{}", payer_address, provider, wei, nonce);
                let tx_hash = keccak256(preimage.as_bytes());

                tracing::info!(
                    payer = %payer_address,
                    provider = %provider,
                    wei = %wei,
                    tx_hash = %tx_hash,
                    "Simulated BSC payment"
                );
                Ok(tx_hash.to_string())
            }
            Settlement::OnChain => {
                let credential = payer
                    .credential
                    .as_ref()
                    .ok_or(ChainError::MissingCredential(Chain::Bsc))?;
                let contract = self.contract()?;
                let wallet = Wallet::from_credential(credential, self.client.config().chain_id)?;

                if wallet.address() != payer_address {
                    tracing::warn!(
                        payer = %payer_address,
                        signer = %wallet.address(),
                        "Signer differs from payer wallet, paying from signer"
                    );
                }

                let tx_hash = TxBuilder::new(self.client.clone(), wallet)
                    .pay_for_data_access(contract, provider, U256::from(wei))
                    .await?;
                Ok(tx_hash.to_string())
            }
        }
    }
}

#[async_trait]
impl ChainAdapter for BscAdapter {
    fn chain(&self) -> Chain {
        Chain::Bsc
    }

    async fn get_balance(&self, address: &str) -> BlockchainResult<Decimal> {
        let owner = parse_evm_address(address)?;
        let contract = self.contract()?;
        let raw = self.client.token_balance(contract, owner).await.inspect_err(|e| {
            tracing::error!(error = %e, wallet = %address, "Failed to get BSC balance");
        })?;
        let raw: u128 = raw
            .try_into()
            .map_err(|_| ChainError::InvalidAmount(format!("{} wei out of range", raw)))?;
        from_base_units(raw, Chain::Bsc.decimals())
    }

    async fn submit_payment(&self, payer: &PayerInfo, payee: &str, amount: Decimal) -> PaymentResult {
        match self.settle(payer, payee, amount).await {
            Ok(tx_id) => PaymentResult::confirmed(tx_id, amount),
            Err(e) => {
                tracing::warn!(error = %e, payer = %payer.wallet_address, provider = %payee, "BSC payment rejected");
                PaymentResult::failed(amount, &e)
            }
        }
    }

    async fn is_healthy(&self) -> bool {
        let healthy = self.client.is_healthy().await;
        metrics::record_chain_health(Chain::Bsc, healthy);
        healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::ChainErrorKind;

    const PAYER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const PROVIDER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn unreachable_config(settlement: Settlement) -> ChainConfig {
        ChainConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 1,
            settlement,
            ..ChainConfig::default()
        }
    }

    fn payer(credential: Option<&str>) -> PayerInfo {
        PayerInfo {
            wallet_address: PAYER.to_string(),
            credential: credential.map(crate::payments::types::Credential::new),
        }
    }

    #[tokio::test]
    async fn test_simulated_payment_returns_tx_hash() {
        let adapter = BscAdapter::new(&unreachable_config(Settlement::Simulated)).await.unwrap();
        let result = adapter.submit_payment(&payer(None), PROVIDER, Decimal::new(25, 1)).await;

        assert!(result.success());
        let id = result.transaction_id().unwrap();
        assert!(id.starts_with("0x"));
        assert_eq!(id.len(), 66);
    }

    #[tokio::test]
    async fn test_invalid_provider_address() {
        let adapter = BscAdapter::new(&unreachable_config(Settlement::Simulated)).await.unwrap();
        let result = adapter
            .submit_payment(&payer(None), "0xProviderBscAddress", Decimal::ONE)
            .await;
        assert!(!result.success());
        assert_eq!(result.error_kind(), Some(ChainErrorKind::InvalidAddress));
    }

    #[tokio::test]
    async fn test_on_chain_requires_credential() {
        let adapter = BscAdapter::new(&unreachable_config(Settlement::OnChain)).await.unwrap();
        let result = adapter.submit_payment(&payer(None), PROVIDER, Decimal::ONE).await;
        assert!(!result.success());
        assert_eq!(result.error_kind(), Some(ChainErrorKind::MissingCredential));
    }

    #[tokio::test]
    async fn test_on_chain_without_contract_is_not_available() {
        let adapter = BscAdapter::new(&unreachable_config(Settlement::OnChain)).await.unwrap();
        let result = adapter
            .submit_payment(
                &payer(Some("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")),
                PROVIDER,
                Decimal::ONE,
            )
            .await;
        assert_eq!(result.error_kind(), Some(ChainErrorKind::NotAvailable));
    }

    #[tokio::test]
    async fn test_balance_without_contract() {
        let adapter = BscAdapter::new(&unreachable_config(Settlement::Simulated)).await.unwrap();
        let err = adapter.get_balance(PAYER).await.unwrap_err();
        assert_eq!(err.kind(), ChainErrorKind::NotAvailable);

        let err = adapter.get_balance("not-an-address").await.unwrap_err();
        assert_eq!(err.kind(), ChainErrorKind::InvalidAddress);
    }

    #[tokio::test]
    async fn test_unreachable_rpc_is_connection_error() {
        let config = ChainConfig {
            contract_id: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            ..unreachable_config(Settlement::Simulated)
        };
        let adapter = BscAdapter::new(&config).await.unwrap();
        let err = adapter.get_balance(PAYER).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!adapter.is_healthy().await);
    }
}
