//! Payment dispatch, balance aggregation and the transaction ledger.

pub mod aggregator;
pub mod dispatcher;
pub mod ledger;
pub mod types;

pub use aggregator::BalanceAggregator;
pub use dispatcher::{DispatchError, PaymentDispatcher};
pub use ledger::{LedgerError, TransactionLedger, TransactionRecord};
pub use types::{BalanceEntry, BalanceQuery, BalanceResult, Credential, PayerInfo, PaymentResult};
