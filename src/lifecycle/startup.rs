//! Startup orchestration.
//!
//! Subsystems initialize in dependency order: config, logging and metrics,
//! chain adapters, ledger, then the listener. Any error here is fatal.

use std::collections::HashMap;
use std::sync::Arc;

use crate::blockchain::{BlockchainResult, BscAdapter, Chain, ChainRegistry, SolanaAdapter};
use crate::config::{ChainsConfig, LedgerConfig, Settlement};
use crate::payments::{Credential, LedgerError, TransactionLedger};

/// Build one adapter per enabled chain.
pub async fn build_registry(chains: &ChainsConfig) -> BlockchainResult<ChainRegistry> {
    let mut registry = ChainRegistry::new();

    if chains.solana.enabled {
        registry.register(Arc::new(SolanaAdapter::new(&chains.solana)?));
    }
    if chains.bsc.enabled {
        registry.register(Arc::new(BscAdapter::new(&chains.bsc).await?));
    }

    if registry.is_empty() {
        tracing::warn!("No chains enabled; payments will be rejected as unsupported");
    } else {
        tracing::info!(chains = ?registry.chains(), "Chain adapters ready");
    }
    Ok(registry)
}

/// Read the demo signing key for each enabled chain that signs locally.
///
/// Only on-chain settlement signs, so simulated chains never receive a key.
/// `lookup` abstracts `std::env::var`.
pub fn load_credentials<F>(chains: &ChainsConfig, lookup: F) -> HashMap<Chain, Credential>
where
    F: Fn(&str) -> Option<String>,
{
    Chain::ALL
        .into_iter()
        .filter_map(|chain| {
            let config = chains.get(chain);
            if !config.enabled
                || config.settlement != Settlement::OnChain
                || config.signer_key_env.is_empty()
            {
                return None;
            }
            let secret = lookup(&config.signer_key_env).filter(|s| !s.trim().is_empty())?;
            tracing::info!(chain = %chain, variable = %config.signer_key_env, "Loaded demo signing credential");
            Some((chain, Credential::new(secret)))
        })
        .collect()
}

/// Open the ledger, loading persisted records when a path is configured.
pub fn open_ledger(config: &LedgerConfig) -> Result<TransactionLedger, LedgerError> {
    match &config.persistence_path {
        Some(path) => TransactionLedger::load_from_file(path),
        None => Ok(TransactionLedger::new(None)),
    }
}
