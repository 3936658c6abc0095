//! Routes a payment to the adapter registered for its chain.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::blockchain::{Chain, ChainRegistry};
use crate::observability::metrics;
use crate::payments::types::{PayerInfo, PaymentResult};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Identifier unknown, or known but no adapter configured for it.
    #[error("Unsupported blockchain: {0}")]
    UnsupportedChain(String),
}

/// Selects exactly one adapter per payment. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct PaymentDispatcher {
    registry: Arc<ChainRegistry>,
}

impl PaymentDispatcher {
    pub fn new(registry: Arc<ChainRegistry>) -> Self {
        Self { registry }
    }

    /// Submit `amount` from `payer` to `payee` on `chain`.
    ///
    /// Adapter failures come back as `Ok` with `success == false`; only a
    /// chain without an adapter is an `Err`, and it is raised before any
    /// network call.
    pub async fn process_payment(
        &self,
        chain: &str,
        payer: &PayerInfo,
        payee: &str,
        amount: Decimal,
    ) -> Result<PaymentResult, DispatchError> {
        let adapter = chain
            .parse::<Chain>()
            .ok()
            .and_then(|chain| self.registry.get(chain))
            .ok_or_else(|| DispatchError::UnsupportedChain(chain.to_string()))?;
        let chain = adapter.chain();

        tracing::debug!(chain = %chain, payer = %payer.wallet_address, payee, amount = %amount, "Dispatching payment");

        let result = adapter.submit_payment(payer, payee, amount).await;
        metrics::record_payment(chain, result.success());

        if result.success() {
            tracing::info!(
                chain = %chain,
                tx_id = result.transaction_id().unwrap_or_default(),
                amount = %amount,
                "Payment confirmed"
            );
        } else {
            tracing::warn!(
                chain = %chain,
                error = result.error_message().unwrap_or_default(),
                "Payment failed"
            );
        }
        Ok(result)
    }
}
