//! Transaction registry: open charging sessions of the central system

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::domain::Transaction;

/// Thread-safe store of open transactions keyed by transaction ID.
///
/// IDs come from a process-wide counter starting at 1 and are never
/// reused, even after the transaction is stopped.
pub struct TransactionRegistry {
    transactions: DashMap<i64, Transaction>,
    next_id: AtomicI64,
}

/// Shared, reference-counted transaction registry
pub type SharedTransactionRegistry = Arc<TransactionRegistry>;

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub(crate) fn starting_at(first_id: i64) -> Self {
        Self {
            transactions: DashMap::new(),
            next_id: AtomicI64::new(first_id),
        }
    }

    /// Wrap in `Arc` for shared ownership
    pub fn shared() -> SharedTransactionRegistry {
        Arc::new(Self::new())
    }

    /// Open a transaction and return its newly assigned ID.
    ///
    /// `None` once the ID space is used up; the counter never wraps.
    pub fn start(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        id_tag: &str,
        meter_start: i64,
    ) -> Option<i64> {
        let id = match self
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
        {
            Ok(id) => id,
            Err(_) => {
                warn!(charge_point_id, "Transaction IDs exhausted");
                return None;
            }
        };
        let transaction = Transaction::new(id, charge_point_id, connector_id, id_tag, meter_start);
        self.transactions.insert(id, transaction);
        info!(charge_point_id, transaction_id = id, "Transaction opened");
        Some(id)
    }

    /// Close a transaction. Unknown IDs are not an error.
    pub fn stop(&self, transaction_id: i64) -> Option<Transaction> {
        let removed = self.transactions.remove(&transaction_id).map(|(_, tx)| tx);
        if removed.is_none() {
            debug!(transaction_id, "Stop for unknown transaction ignored");
        }
        removed
    }

    pub fn contains(&self, transaction_id: i64) -> bool {
        self.transactions.contains_key(&transaction_id)
    }

    /// Number of open transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// IDs of the open transactions of one charge point
    pub fn active_for(&self, charge_point_id: &str) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .transactions
            .iter()
            .filter(|entry| entry.charge_point_id == charge_point_id)
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────
