use crate::{
    domain::{Balance, HistoryEntry, TransactionKind, UserId},
    ports::{balance, balance::BalancePort, history, history::HistoryPort},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// In-memory balance table
///
/// The map is guarded by its own mutex, independently of the per-user ledger locks.
#[derive(Clone, Debug, Default)]
pub struct MemoryBalanceStore {
    balances: Arc<Mutex<HashMap<UserId, Balance>>>,
}

#[async_trait::async_trait]
impl BalancePort for MemoryBalanceStore {
    async fn read(&self, user_id: UserId) -> Result<Balance, balance::Error> {
        let balance = self
            .balances
            .lock()?
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| Balance::empty(user_id));

        Ok(balance)
    }

    async fn write(
        &self,
        user_id: UserId,
        points: i64,
        updated_at_millis: i64,
    ) -> Result<Balance, balance::Error> {
        let balance = Balance::new(user_id, points, updated_at_millis);
        self.balances.lock()?.insert(user_id, balance.clone());

        Ok(balance)
    }
}

/// In-memory append-only transaction log
#[derive(Clone, Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

#[async_trait::async_trait]
impl HistoryPort for MemoryHistoryStore {
    async fn append(
        &self,
        user_id: UserId,
        amount: i64,
        kind: TransactionKind,
        timestamp_millis: i64,
    ) -> Result<HistoryEntry, history::Error> {
        let mut entries = self.entries.lock()?;
        // Ids are assigned under the log mutex, so id order is insertion order.
        let entry = HistoryEntry {
            entry_id: entries.len() as u64 + 1,
            user_id,
            amount,
            kind,
            timestamp_millis,
        };
        entries.push(entry.clone());

        Ok(entry)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, history::Error> {
        let entries = self
            .entries
            .lock()?
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();

        Ok(entries)
    }
}

/// Message of a [`PoisonError`] from one of the store mutexes
///
/// The original error borrows the guard, so only its text is carried into the port error.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for balance::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}

impl<T> From<PoisonError<T>> for history::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
