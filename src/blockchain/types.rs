//! Chain identifiers, unit conversion and error definitions.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A supported blockchain network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Bsc,
}

impl Chain {
    /// Every supported chain, in display order.
    pub const ALL: [Chain; 2] = [Chain::Solana, Chain::Bsc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Bsc => "bsc",
        }
    }

    /// Decimal exponent between the smallest unit and one whole token.
    pub fn decimals(&self) -> u32 {
        match self {
            Chain::Solana => 9,
            Chain::Bsc => 18,
        }
    }

    /// Public test network endpoint used when none is configured.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Chain::Solana => "https://api.devnet.solana.com",
            Chain::Bsc => "https://data-seed-prebsc-1-s1.binance.org:8545/",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = ChainError;

    /// Case-insensitive match against the supported chain names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_str() == normalized)
            .ok_or_else(|| ChainError::UnsupportedChain(s.to_string()))
    }
}

/// Coarse classification of a chain failure, reported alongside messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainErrorKind {
    UnsupportedChain,
    Connection,
    InsufficientFunds,
    TransactionRejected,
    InvalidAddress,
    InvalidAmount,
    MissingCredential,
    NotAvailable,
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Chain identifier unknown or not configured.
    #[error("Unsupported blockchain: {0}")]
    UnsupportedChain(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Connection(String),

    /// Payer balance cannot cover the transfer plus fees.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Gas estimation failed, the call reverted, or the node refused it.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    /// Address failed chain-specific format validation.
    #[error("Invalid {chain} address '{address}': {reason}")]
    InvalidAddress {
        chain: Chain,
        address: String,
        reason: String,
    },

    /// Amount not representable in the chain's smallest unit.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Chain requires local signing but no credential was supplied.
    #[error("Missing signing credential for {0} payment")]
    MissingCredential(Chain),

    /// Adapter lacks configuration required for the operation.
    #[error("Blockchain not available: {0}")]
    NotAvailable(String),
}

impl ChainError {
    pub fn kind(&self) -> ChainErrorKind {
        match self {
            ChainError::UnsupportedChain(_) => ChainErrorKind::UnsupportedChain,
            ChainError::Connection(_) => ChainErrorKind::Connection,
            ChainError::InsufficientFunds(_) => ChainErrorKind::InsufficientFunds,
            ChainError::TransactionRejected(_) => ChainErrorKind::TransactionRejected,
            ChainError::InvalidAddress { .. } => ChainErrorKind::InvalidAddress,
            ChainError::InvalidAmount(_) => ChainErrorKind::InvalidAmount,
            ChainError::MissingCredential(_) => ChainErrorKind::MissingCredential,
            ChainError::NotAvailable(_) => ChainErrorKind::NotAvailable,
        }
    }

    /// Whether a caller may retry with backoff. Only connectivity failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::Connection(_))
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, ChainError>;

/// Check an address against the chain's format.
///
/// Solana: base58 encoding of a 32-byte public key.
/// BSC: 20-byte hex address with `0x` prefix.
pub fn validate_address(chain: Chain, address: &str) -> BlockchainResult<()> {
    let invalid = |reason: String| ChainError::InvalidAddress {
        chain,
        address: address.to_string(),
        reason,
    };

    match chain {
        Chain::Solana => {
            let bytes = bs58::decode(address)
                .into_vec()
                .map_err(|e| invalid(e.to_string()))?;
            if bytes.len() != 32 {
                return Err(invalid(format!("expected 32 bytes, got {}", bytes.len())));
            }
            Ok(())
        }
        Chain::Bsc => parse_evm_address(address).map(|_| ()),
    }
}

/// Parse a `0x`-prefixed EVM address.
pub fn parse_evm_address(address: &str) -> BlockchainResult<Address> {
    if !address.starts_with("0x") {
        return Err(ChainError::InvalidAddress {
            chain: Chain::Bsc,
            address: address.to_string(),
            reason: "missing 0x prefix".to_string(),
        });
    }
    address.parse::<Address>().map_err(|e| ChainError::InvalidAddress {
        chain: Chain::Bsc,
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Convert an integer amount in the smallest unit to whole tokens.
pub fn from_base_units(raw: u128, decimals: u32) -> BlockchainResult<Decimal> {
    let overflow = || ChainError::InvalidAmount(format!("{} base units out of range", raw));
    let scale = 10u128.checked_pow(decimals).ok_or_else(overflow)?;

    let whole = Decimal::from_u128(raw / scale).ok_or_else(overflow)?;
    let fraction = Decimal::from_u128(raw % scale).ok_or_else(overflow)?;
    let divisor = Decimal::from_u128(scale).ok_or_else(overflow)?;

    whole
        .checked_add(fraction / divisor)
        .map(|d| d.normalize())
        .ok_or_else(overflow)
}

/// Convert whole tokens to an integer amount in the smallest unit.
///
/// Fails when the amount is negative, too large, or more precise than the
/// chain's smallest unit.
pub fn to_base_units(amount: Decimal, decimals: u32) -> BlockchainResult<u128> {
    if amount.is_sign_negative() {
        return Err(ChainError::InvalidAmount(format!("{} is negative", amount)));
    }
    let multiplier = Decimal::from_u128(10u128.pow(decimals))
        .ok_or_else(|| ChainError::InvalidAmount("unsupported precision".to_string()))?;
    let scaled = amount
        .checked_mul(multiplier)
        .ok_or_else(|| ChainError::InvalidAmount(format!("{} is too large", amount)))?;
    if !scaled.fract().is_zero() {
        return Err(ChainError::InvalidAmount(format!(
            "{} has more than {} decimal places",
            amount, decimals
        )));
    }
    scaled
        .to_u128()
        .ok_or_else(|| ChainError::InvalidAmount(format!("{} is too large", amount)))
}
