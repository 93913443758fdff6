//! In-memory bookkeeping of the transaction open on each EVSE

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::domain::ports::{ActiveTransaction, TransactionContext};

#[derive(Default)]
pub struct InMemoryTransactionContext {
    active: DashMap<i32, ActiveTransaction>,
}

impl InMemoryTransactionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `transaction_id` as open on `evse_id`, replacing any previous one.
    pub fn start_transaction(
        &self,
        evse_id: i32,
        transaction_id: impl Into<String>,
        start_time: DateTime<Utc>,
    ) {
        let id = transaction_id.into();
        debug!(evse_id, transaction_id = %id, "Transaction started");
        self.active.insert(evse_id, ActiveTransaction { id, start_time });
    }

    /// Close the transaction on `evse_id`, returning it if one was open.
    pub fn end_transaction(&self, evse_id: i32) -> Option<ActiveTransaction> {
        let ended = self.active.remove(&evse_id).map(|(_, tx)| tx);
        if let Some(tx) = &ended {
            debug!(evse_id, transaction_id = %tx.id, "Transaction ended");
        }
        ended
    }
}

impl TransactionContext for InMemoryTransactionContext {
    fn active_transaction(&self, evse_id: i32) -> Option<ActiveTransaction> {
        self.active.get(&evse_id).map(|entry| entry.value().clone())
    }
}
