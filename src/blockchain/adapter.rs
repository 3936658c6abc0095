//! Uniform interface over one chain's balance and payment operations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::blockchain::types::{BlockchainResult, Chain};
use crate::payments::types::{PayerInfo, PaymentResult};

/// Isolates one chain's SDK/RPC specifics.
///
/// Implementations hold their RPC client for the lifetime of the process and
/// are shared between requests without locking.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// The chain this adapter talks to.
    fn chain(&self) -> Chain;

    /// Balance of `address` in whole tokens.
    ///
    /// # Errors
    /// `InvalidAddress` for malformed addresses, `Connection` when the RPC
    /// endpoint cannot be reached.
    async fn get_balance(&self, address: &str) -> BlockchainResult<Decimal>;

    /// Move `amount` whole tokens from the payer to `payee`.
    ///
    /// Never fails through a separate channel: every failure is reported as
    /// a `PaymentResult` with `success == false`.
    async fn submit_payment(&self, payer: &PayerInfo, payee: &str, amount: Decimal) -> PaymentResult;

    /// Whether the RPC endpoint currently answers.
    async fn is_healthy(&self) -> bool;
}

/// Adapters registered at startup, keyed by chain.
#[derive(Clone, Default)]
pub struct ChainRegistry {
    adapters: HashMap<Chain, Arc<dyn ChainAdapter>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own chain, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ChainAdapter>) {
        let chain = adapter.chain();
        if self.adapters.insert(chain, adapter).is_some() {
            tracing::warn!(chain = %chain, "Replacing previously registered adapter");
        }
    }

    pub fn with(mut self, adapter: Arc<dyn ChainAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, chain: Chain) -> Option<&Arc<dyn ChainAdapter>> {
        self.adapters.get(&chain)
    }

    /// Registered chains in stable order.
    pub fn chains(&self) -> Vec<Chain> {
        Chain::ALL
            .into_iter()
            .filter(|chain| self.adapters.contains_key(chain))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for ChainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRegistry")
            .field("chains", &self.chains())
            .finish()
    }
}
