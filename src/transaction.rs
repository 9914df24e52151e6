//! Caller-facing transaction handle: a thin wrapper around a
//! `TransactionId` that drives `BufferPool::transaction_complete` on
//! commit and abort.

use crate::buffer_pool::BufferPool;
use crate::error::DbResult;
use crate::transaction_id::TransactionId;
use log::info;

pub struct Transaction {
    id: TransactionId,
}

impl Transaction {
    /// Begins a new transaction. Does not itself take any locks —
    /// locks are acquired lazily by the first page access.
    pub fn start() -> Self {
        let id = TransactionId::new();
        info!("{:?} started", id);
        Transaction { id }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Flushes every page this transaction dirtied and releases its
    /// locks. the contract: commit is FORCE — every dirty page reaches
    /// disk before the call returns.
    pub fn commit(&self, buffer_pool: &BufferPool) -> DbResult<()> {
        buffer_pool.transaction_complete(self.id, true)
    }

    /// Discards every page this transaction dirtied, without writing
    /// any of them back, and releases its locks.
    pub fn abort(&self, buffer_pool: &BufferPool) -> DbResult<()> {
        buffer_pool.transaction_complete(self.id, false)
    }
}
