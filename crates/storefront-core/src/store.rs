//! In-Memory Order Store
//!
//! Process-lifetime mapping of checkout-session id to order record, split
//! into disjoint `pending` and `completed` partitions. There is deliberately
//! no persistence: a session confirmed by a fresh process is handled by the
//! reconciler's cold-reconstruction path instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::Mutex as AsyncMutex;

use crate::order::Order;

/// Pending/completed order partitions keyed by checkout-session id.
///
/// Each operation takes the relevant locks for its whole critical section,
/// so a session is never observable in both partitions (or neither) during
/// [`promote`](Self::promote). Entries are never evicted; growth is bounded
/// by process lifetime, which is an accepted limitation.
#[derive(Debug, Default)]
pub struct OrderStore {
    pending: RwLock<HashMap<String, Order>>,
    completed: RwLock<HashMap<String, Order>>,
    confirm_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl OrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) a pending order for a newly created session.
    pub fn put_pending(&self, session_id: &str, order: Order) {
        let mut pending = self.pending.write().unwrap();
        pending.insert(session_id.to_string(), order);
    }

    #[must_use]
    pub fn get_pending(&self, session_id: &str) -> Option<Order> {
        self.pending.read().unwrap().get(session_id).cloned()
    }

    /// Drop a pending entry without completing it.
    pub fn remove_pending(&self, session_id: &str) -> Option<Order> {
        self.pending.write().unwrap().remove(session_id)
    }

    #[must_use]
    pub fn completed(&self, session_id: &str) -> Option<Order> {
        self.completed.read().unwrap().get(session_id).cloned()
    }

    /// Sole idempotency gate for notification dispatch.
    #[must_use]
    pub fn is_completed(&self, session_id: &str) -> bool {
        self.completed.read().unwrap().contains_key(session_id)
    }

    /// Move a session into the completed partition, deleting any pending
    /// entry in the same step.
    pub fn promote(&self, session_id: &str, order: Order) {
        let mut completed = self.completed.write().unwrap();
        let mut pending = self.pending.write().unwrap();
        pending.remove(session_id);
        completed.insert(session_id.to_string(), order);
        tracing::debug!(session_id, "order promoted to completed");
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.read().unwrap().len()
    }

    /// Per-session confirmation lock. Concurrent confirmations of the same
    /// session serialize on this, which keeps the gate-check and the awaited
    /// notification send from interleaving (at-most-one send per session).
    #[must_use]
    pub fn confirm_lock(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.confirm_locks.lock().unwrap();
        locks
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}
