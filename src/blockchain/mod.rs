//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! ChainConfig (RPC URLs, contract id, settlement mode)
//!     → solana.rs / bsc.rs (one ChainAdapter per chain)
//!     → client.rs (EVM RPC connection with timeouts and failover)
//!     → transaction.rs (gas pricing, sign, broadcast, receipt)
//! ```
//!
//! # Security Constraints
//! - Signing keys arrive as redacted credentials and are never logged
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when a chain is unreachable

pub mod adapter;
pub mod bsc;
pub mod client;
pub mod solana;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use adapter::{ChainAdapter, ChainRegistry};
pub use bsc::BscAdapter;
pub use client::EvmClient;
pub use solana::SolanaAdapter;
pub use types::{BlockchainResult, Chain, ChainError, ChainErrorKind};
pub use wallet::Wallet;
