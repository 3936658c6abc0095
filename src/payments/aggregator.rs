//! Concurrent multi-chain balance lookup with per-chain failure isolation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::FutureExt;

use crate::blockchain::{Chain, ChainRegistry};
use crate::observability::metrics;
use crate::payments::types::{BalanceEntry, BalanceQuery, BalanceResult};

#[derive(Debug, Clone)]
pub struct BalanceAggregator {
    registry: Arc<ChainRegistry>,
}

impl BalanceAggregator {
    pub fn new(registry: Arc<ChainRegistry>) -> Self {
        Self { registry }
    }

    /// Query every chain in `query` at once and wait for all of them.
    ///
    /// Keys in the result are exactly the chains in the query. A failure on
    /// one chain (error, missing adapter or panic) only affects its own entry.
    pub async fn get_balances(&self, query: &BalanceQuery) -> BalanceResult {
        let lookups = query
            .addresses
            .iter()
            .map(|(&chain, address)| async move { (chain, self.balance_entry(chain, address).await) });

        join_all(lookups).await.into_iter().collect()
    }

    async fn balance_entry(&self, chain: Chain, address: &str) -> BalanceEntry {
        let Some(adapter) = self.registry.get(chain) else {
            metrics::record_balance_query(chain, false);
            return BalanceEntry::Error {
                error: format!("Unsupported blockchain: {}", chain),
            };
        };

        let outcome = AssertUnwindSafe(adapter.get_balance(address))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(amount)) => {
                metrics::record_balance_query(chain, true);
                BalanceEntry::Amount(amount)
            }
            Ok(Err(e)) => {
                metrics::record_balance_query(chain, false);
                tracing::warn!(chain = %chain, wallet = %address, error = %e, "Balance query failed");
                BalanceEntry::Error { error: e.to_string() }
            }
            Err(_) => {
                metrics::record_balance_query(chain, false);
                tracing::error!(chain = %chain, wallet = %address, "Balance query panicked");
                BalanceEntry::Error {
                    error: format!("Internal error while querying {} balance", chain),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{BlockchainResult, ChainAdapter, ChainError};
    use crate::payments::types::{PayerInfo, PaymentResult};
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    enum Behavior {
        Balance(Decimal),
        Fail,
        Panic,
    }

    struct FixedAdapter {
        chain: Chain,
        behavior: Behavior,
    }

    #[async_trait]
    impl ChainAdapter for FixedAdapter {
        fn chain(&self) -> Chain {
            self.chain
        }

        async fn get_balance(&self, _address: &str) -> BlockchainResult<Decimal> {
            match self.behavior {
                Behavior::Balance(amount) => Ok(amount),
                Behavior::Fail => Err(ChainError::Connection("connection refused".into())),
                Behavior::Panic => panic!("adapter bug"),
            }
        }

        async fn submit_payment(&self, _payer: &PayerInfo, _payee: &str, amount: Decimal) -> PaymentResult {
            PaymentResult::confirmed("unused", amount)
        }

        async fn is_healthy(&self) -> bool {
            true
        }
    }

    fn aggregator(bsc: Behavior) -> BalanceAggregator {
        let registry = ChainRegistry::new()
            .with(Arc::new(FixedAdapter {
                chain: Chain::Solana,
                behavior: Behavior::Balance(Decimal::new(15, 1)),
            }))
            .with(Arc::new(FixedAdapter {
                chain: Chain::Bsc,
                behavior: bsc,
            }));
        BalanceAggregator::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_only_requested_chains_present() {
        let balances = aggregator(Behavior::Fail)
            .get_balances(&BalanceQuery::new().with(Chain::Solana, "sol-wallet"))
            .await;

        assert_eq!(balances.len(), 1);
        assert_eq!(balances[&Chain::Solana].amount(), Some(Decimal::new(15, 1)));
    }

    #[tokio::test]
    async fn test_failing_chain_is_isolated() {
        let query = BalanceQuery::new()
            .with(Chain::Solana, "sol-wallet")
            .with(Chain::Bsc, "0xwallet");
        let balances = aggregator(Behavior::Fail).get_balances(&query).await;

        assert_eq!(balances[&Chain::Solana].amount(), Some(Decimal::new(15, 1)));
        assert_eq!(balances[&Chain::Bsc].error(), Some("RPC error: connection refused"));
    }

    #[tokio::test]
    async fn test_panicking_adapter_is_isolated() {
        let query = BalanceQuery::new()
            .with(Chain::Solana, "sol-wallet")
            .with(Chain::Bsc, "0xwallet");
        let balances = aggregator(Behavior::Panic).get_balances(&query).await;

        assert!(balances[&Chain::Solana].amount().is_some());
        assert!(balances[&Chain::Bsc].error().is_some());
    }

    #[tokio::test]
    async fn test_missing_adapter_and_empty_query() {
        let registry = ChainRegistry::new().with(Arc::new(FixedAdapter {
            chain: Chain::Solana,
            behavior: Behavior::Balance(Decimal::ONE),
        }));
        let aggregator = BalanceAggregator::new(Arc::new(registry));

        let balances = aggregator
            .get_balances(&BalanceQuery::new().with(Chain::Bsc, "0xwallet"))
            .await;
        assert_eq!(balances[&Chain::Bsc].error(), Some("Unsupported blockchain: bsc"));

        assert!(aggregator.get_balances(&BalanceQuery::new()).await.is_empty());
    }
}
