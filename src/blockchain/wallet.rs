//! Local signing wallet for BSC settlement.
//!
//! # Security
//! - Keys arrive as a [`Credential`] and are parsed only at payment time
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::blockchain::types::{BlockchainResult, ChainError};
use crate::payments::types::Credential;

/// Signer bound to a chain ID for EIP-155 replay protection.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string, with or without `0x`.
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let mut signer: PrivateKeySigner = key_hex.parse().map_err(|e| {
            ChainError::TransactionRejected(format!("Invalid private key format: {}", e))
        })?;
        signer.set_chain_id(Some(chain_id));

        Ok(Self { signer, chain_id })
    }

    pub fn from_credential(credential: &Credential, chain_id: u64) -> BlockchainResult<Self> {
        Self::from_private_key(credential.expose(), chain_id)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Network wallet for a signing provider.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
