//! Payment and balance types shared by adapters, dispatcher and handlers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::blockchain::types::{Chain, ChainError, ChainErrorKind};

/// Opaque signing secret. Never printed, serialized or logged.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the secret for in-process signing.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The paying side of a payment.
#[derive(Debug, Clone)]
pub struct PayerInfo {
    pub wallet_address: String,
    /// Present only for chains that sign locally.
    pub credential: Option<Credential>,
}

/// Current time as an ISO-8601 string with millisecond precision.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Uniform outcome of a payment submission.
///
/// Construct through [`PaymentResult::confirmed`] or [`PaymentResult::failed`]:
/// a successful result always carries a transaction id, a failed one always
/// carries an error message and never an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ChainErrorKind>,
}

impl PaymentResult {
    pub fn confirmed(transaction_id: impl Into<String>, amount: Decimal) -> Self {
        let transaction_id = transaction_id.into();
        debug_assert!(!transaction_id.is_empty());
        Self {
            success: true,
            transaction_id: Some(transaction_id),
            amount,
            timestamp: iso_timestamp(),
            error_message: None,
            error_kind: None,
        }
    }

    pub fn failed(amount: Decimal, error: &ChainError) -> Self {
        Self {
            success: false,
            transaction_id: None,
            amount,
            timestamp: iso_timestamp(),
            error_message: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn error_kind(&self) -> Option<ChainErrorKind> {
        self.error_kind
    }
}

/// Wallet addresses to query, keyed by chain. Absent chains are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceQuery {
    pub addresses: BTreeMap<Chain, String>,
}

impl BalanceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, chain: Chain, address: impl Into<String>) -> Self {
        self.addresses.insert(chain, address.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// One chain's balance, or why it could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BalanceEntry {
    Amount(#[serde(with = "rust_decimal::serde::float")] Decimal),
    Error { error: String },
}

impl BalanceEntry {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            BalanceEntry::Amount(amount) => Some(*amount),
            BalanceEntry::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BalanceEntry::Amount(_) => None,
            BalanceEntry::Error { error } => Some(error),
        }
    }
}

/// Per-chain balances; entries are independent of each other.
pub type BalanceResult = BTreeMap<Chain, BalanceEntry>;
