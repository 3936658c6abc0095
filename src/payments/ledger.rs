//! Record of completed payments, with optional JSON persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::Chain;
use crate::payments::types::PaymentResult;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// One confirmed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub user_id: String,
    pub data_id: String,
    pub chain: Chain,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub timestamp: String,
}

/// A record plus its position in insertion order.
#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    record: TransactionRecord,
}

/// A thread-safe ledger keyed by transaction id. Records keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct TransactionLedger {
    inner: Arc<DashMap<String, Entry>>,
    next_seq: Arc<AtomicU64>,
    persistence_path: Option<String>,
}

impl TransactionLedger {
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
            persistence_path,
        }
    }

    /// Open the ledger at `path`, loading previous records if the file exists.
    ///
    /// The file holds records oldest first.
    pub fn load_from_file(path: &str) -> Result<Self, LedgerError> {
        let ledger = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: Vec<TransactionRecord> = serde_json::from_reader(reader)?;
            for record in records {
                ledger.insert(record);
            }
            tracing::info!(path, records = ledger.inner.len(), "Loaded transaction ledger");
        }
        Ok(ledger)
    }

    /// Write all records to the persistence path, if one is set.
    ///
    /// Writes a sibling `.tmp` file and renames it over the target.
    pub fn save_to_file(&self) -> Result<(), LedgerError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let records = self.ordered(|_| true);
        let tmp_path = temp_path(Path::new(path));

        let write = || -> Result<(), LedgerError> {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, &records)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            std::fs::rename(&tmp_path, path)?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        tracing::info!(path = %path, records = records.len(), "Saved transaction ledger");
        Ok(())
    }

    fn insert(&self, record: TransactionRecord) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.inner.insert(record.id.clone(), Entry { seq, record });
    }

    /// Matching records, oldest first.
    fn ordered(&self, keep: impl Fn(&TransactionRecord) -> bool) -> Vec<TransactionRecord> {
        let mut entries: Vec<Entry> = self
            .inner
            .iter()
            .filter(|e| keep(&e.value().record))
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.record).collect()
    }

    /// Record a confirmed payment. Failed results are ignored.
    pub fn record(&self, user_id: &str, data_id: &str, chain: Chain, result: &PaymentResult) -> Option<TransactionRecord> {
        let id = result.transaction_id().filter(|_| result.success())?;
        let record = TransactionRecord {
            id: id.to_string(),
            user_id: user_id.to_string(),
            data_id: data_id.to_string(),
            chain,
            amount: result.amount(),
            timestamp: result.timestamp().to_string(),
        };
        self.insert(record.clone());
        Some(record)
    }

    /// The user's records, newest first.
    pub fn history(&self, user_id: &str) -> Vec<TransactionRecord> {
        let mut records = self.ordered(|r| r.user_id == user_id);
        records.reverse();
        records
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ChainError;

    #[test]
    fn test_records_only_confirmed_payments() {
        let ledger = TransactionLedger::new(None);

        let ok = PaymentResult::confirmed("sol_1", Decimal::from(10));
        assert!(ledger.record("user123", "d1", Chain::Solana, &ok).is_some());

        let failed = PaymentResult::failed(Decimal::ONE, &ChainError::Connection("down".into()));
        assert!(ledger.record("user123", "d1", Chain::Solana, &failed).is_none());

        assert_eq!(ledger.count(), 1);
    }

    #[test]
    fn test_history_is_per_user() {
        let ledger = TransactionLedger::new(None);
        ledger.record("alice", "d1", Chain::Solana, &PaymentResult::confirmed("a1", Decimal::ONE));
        ledger.record("bob", "d2", Chain::Bsc, &PaymentResult::confirmed("b1", Decimal::TWO));
        ledger.record("alice", "d3", Chain::Bsc, &PaymentResult::confirmed("a2", Decimal::TEN));

        let history = ledger.history("alice");
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.user_id == "alice"));
        assert_eq!(history[0].id, "a2");
        assert_eq!(history[1].id, "a1");
        assert!(ledger.history("carol").is_empty());
    }

    #[test]
    fn test_same_millisecond_keeps_insertion_order() {
        let ledger = TransactionLedger::new(None);
        let record = |id: &str| TransactionRecord {
            id: id.to_string(),
            user_id: "alice".to_string(),
            data_id: "d1".to_string(),
            chain: Chain::Solana,
            amount: Decimal::ONE,
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        };
        ledger.insert(record("zz_first"));
        ledger.insert(record("aa_second"));

        let history = ledger.history("alice");
        assert_eq!(history[0].id, "aa_second");
        assert_eq!(history[1].id, "zz_first");
    }

    #[test]
    fn test_persistence() {
        let path = std::env::temp_dir().join(format!("biocoin_ledger_{}.json", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();

        let ledger = TransactionLedger::new(Some(path.clone()));
        ledger.record("user123", "d1", Chain::Bsc, &PaymentResult::confirmed("0xabc", Decimal::new(25, 1)));
        ledger.record("user123", "d2", Chain::Solana, &PaymentResult::confirmed("sol_1", Decimal::ONE));
        ledger.save_to_file().unwrap();

        let loaded = TransactionLedger::load_from_file(&path).unwrap();
        let history = loaded.history("user123");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, "sol_1");
        assert_eq!(history[1].amount, Decimal::new(25, 1));
        assert_eq!(history[1].chain, Chain::Bsc);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_save_replaces_existing_file_without_leftovers() {
        let path = std::env::temp_dir().join(format!("biocoin_ledger_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "stale contents that are longer than the new ledger").unwrap();
        let path_str = path.to_string_lossy().to_string();

        let ledger = TransactionLedger::new(Some(path_str.clone()));
        ledger.record("user123", "d1", Chain::Solana, &PaymentResult::confirmed("sol_1", Decimal::ONE));
        ledger.save_to_file().unwrap();

        assert!(!temp_path(&path).exists());
        let loaded = TransactionLedger::load_from_file(&path_str).unwrap();
        assert_eq!(loaded.count(), 1);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_failed_save_is_reported() {
        let dir = std::env::temp_dir().join(format!("biocoin_ledger_{}", uuid::Uuid::new_v4()));
        let ledger = TransactionLedger::new(Some(dir.join("ledger.json").to_string_lossy().to_string()));
        ledger.record("user123", "d1", Chain::Solana, &PaymentResult::confirmed("sol_1", Decimal::ONE));

        let err = ledger.save_to_file().unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
        assert!(!dir.exists());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("biocoin_ledger_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not json").unwrap();

        let err = TransactionLedger::load_from_file(&path.to_string_lossy()).unwrap_err();
        assert!(matches!(err, LedgerError::Format(_)));

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
