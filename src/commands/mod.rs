use std::sync::Arc;

use crate::{
    config::ReadConsistency,
    domain::{now_millis, Balance, HistoryEntry, TransactionKind, UserId},
    lock::KeyedLocks,
    ports::{balance::BalancePort, history::HistoryPort},
};

pub mod charge;
pub mod get_balance;
pub mod get_history;
pub mod use_points;

/// Point ledger
///
/// Mutations of a user are serialized through a per-user lock taken from [`KeyedLocks`].
/// Reads only take that lock when configured with [`ReadConsistency::Linearizable`].
pub struct DomainLogic<B, H> {
    balances: Arc<B>,
    history: Arc<H>,
    locks: KeyedLocks,
    read_consistency: ReadConsistency,
}

impl<B, H> DomainLogic<B, H> {
    pub fn new(balances: Arc<B>, history: Arc<H>, read_consistency: ReadConsistency) -> Self {
        Self {
            balances,
            history,
            locks: KeyedLocks::new(),
            read_consistency,
        }
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }
}

impl<B, H> Clone for DomainLogic<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: self.balances.clone(),
            history: self.history.clone(),
            locks: self.locks.clone(),
            read_consistency: self.read_consistency,
        }
    }
}

impl<B, H> DomainLogic<B, H>
where
    B: BalancePort,
    H: HistoryPort,
{
    async fn read_balance(&self, user_id: UserId) -> Result<Balance, Error> {
        let balance = match self.read_consistency {
            ReadConsistency::Relaxed => self.balances.read(user_id).await?,
            ReadConsistency::Linearizable => {
                self.locks
                    .run_exclusive(user_id, || self.balances.read(user_id))
                    .await?
            }
        };

        Ok(balance)
    }

    async fn read_history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, Error> {
        let entries = match self.read_consistency {
            ReadConsistency::Relaxed => self.history.list_by_user(user_id).await?,
            ReadConsistency::Linearizable => {
                self.locks
                    .run_exclusive(user_id, || self.history.list_by_user(user_id))
                    .await?
            }
        };

        Ok(entries)
    }

    /// Validate, then apply a transaction under the lock of `user_id`
    async fn commit(
        &self,
        user_id: UserId,
        amount: i64,
        kind: TransactionKind,
    ) -> Result<Balance, Error> {
        if amount < 0 {
            tracing::warn!(user_id, amount, %kind, "rejected negative amount");
            return Err(Error::InvalidAmount { kind, amount });
        }

        self.locks
            .run_exclusive(user_id, || self.commit_locked(user_id, amount, kind))
            .await
    }

    /// Read-modify-write of a balance followed by the matching history entry
    ///
    /// Must only run while holding the lock of `user_id`.
    async fn commit_locked(
        &self,
        user_id: UserId,
        amount: i64,
        kind: TransactionKind,
    ) -> Result<Balance, Error> {
        let current = self.balances.read(user_id).await?;

        let points = match kind.apply(current.points, amount) {
            Some(points) => points,
            None => {
                tracing::warn!(user_id, amount, current = current.points, %kind, "rejected transaction");
                return Err(match kind {
                    TransactionKind::Charge => Error::Overflow {
                        current_points: current.points,
                        amount,
                    },
                    TransactionKind::Use => Error::InsufficientBalance {
                        current_points: current.points,
                        amount,
                    },
                });
            }
        };

        // One timestamp for both records, never older than the previous update
        let timestamp = now_millis().max(current.updated_at_millis);
        let balance = self.balances.write(user_id, points, timestamp).await?;
        let entry = match self.history.append(user_id, amount, kind, timestamp).await {
            Ok(entry) => entry,
            Err(err) => {
                // Put the previous balance back so no change survives without its entry.
                // Relaxed readers may still have seen the new value in between.
                tracing::error!(user_id, amount, %kind, "history append failed, restoring balance");
                self.balances
                    .write(user_id, current.points, current.updated_at_millis)
                    .await?;
                return Err(err.into());
            }
        };

        tracing::debug!(
            user_id,
            amount,
            %kind,
            points = balance.points,
            entry_id = entry.entry_id,
            "committed transaction"
        );

        Ok(balance)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("balance port error: {0:?}")]
    Balance(#[from] crate::ports::balance::Error),
    #[error("history port error: {0:?}")]
    History(#[from] crate::ports::history::Error),

    /// Negative amount for a charge or use
    #[error("cannot {} a negative amount: {amount}", .kind.verb())]
    InvalidAmount { kind: TransactionKind, amount: i64 },

    /// Use of more points than the user holds
    #[error("not enough points: {current_points} available, {amount} requested")]
    InsufficientBalance { current_points: i64, amount: i64 },

    #[error("charging {amount} would overflow a balance of {current_points}")]
    Overflow { current_points: i64, amount: i64 },
}

/// Coarse classification of an [`Error`], used by the transport layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidAmount,
    InsufficientBalance,
    Unclassified,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAmount { .. } | Error::Overflow { .. } => ErrorKind::InvalidAmount,
            Error::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Error::Balance(_) | Error::History(_) => ErrorKind::Unclassified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::{MemoryBalanceStore, MemoryHistoryStore},
        ports::{balance::MockBalancePort, history::MockHistoryPort},
    };
    use rstest::*;
    use speculoos::prelude::*;

    #[fixture]
    fn logic() -> DomainLogic<MemoryBalanceStore, MemoryHistoryStore> {
        DomainLogic::new(
            Arc::new(MemoryBalanceStore::default()),
            Arc::new(MemoryHistoryStore::default()),
            ReadConsistency::Relaxed,
        )
    }

    #[rstest]
    #[case(TransactionKind::Charge)]
    #[case(TransactionKind::Use)]
    #[tokio::test]
    async fn test_negative_amount_never_touches_ports(#[case] kind: TransactionKind) {
        // GIVEN ports that must not be called at all
        let mut balances = MockBalancePort::new();
        balances.expect_read().times(0);
        balances.expect_write().times(0);
        let mut history = MockHistoryPort::new();
        history.expect_append().times(0);
        let logic = DomainLogic::new(
            Arc::new(balances),
            Arc::new(history),
            ReadConsistency::Relaxed,
        );

        // WHEN committing a negative amount
        let res = logic.commit(1, -1, kind).await;

        // THEN it fails validation before taking the lock
        assert_that!(res)
            .is_err()
            .matches(|err| err.kind() == ErrorKind::InvalidAmount);
        assert_that!(logic.locks().is_empty()).is_true();
    }

    #[tokio::test]
    async fn test_insufficient_balance_does_not_write() {
        // GIVEN a user with 100 points
        let mut balances = MockBalancePort::new();
        balances
            .expect_read()
            .times(1)
            .returning(|user_id| Ok(Balance::new(user_id, 100, 0)));
        balances.expect_write().times(0);
        let mut history = MockHistoryPort::new();
        history.expect_append().times(0);
        let logic = DomainLogic::new(
            Arc::new(balances),
            Arc::new(history),
            ReadConsistency::Relaxed,
        );

        // WHEN using more than that
        let res = logic.commit(1, 101, TransactionKind::Use).await;

        // THEN it is rejected and the lock is free again
        assert_that!(res).is_err().matches(|err| {
            matches!(
                err,
                Error::InsufficientBalance {
                    current_points: 100,
                    amount: 101
                }
            )
        });
        assert_that!(logic.locks().acquire(1).try_lock().is_ok()).is_true();
    }

    #[tokio::test]
    async fn test_failed_append_restores_balance() {
        // GIVEN a user with 100 points and a history port that fails
        let mut seq = mockall::Sequence::new();
        let mut balances = MockBalancePort::new();
        balances
            .expect_read()
            .times(1)
            .returning(|user_id| Ok(Balance::new(user_id, 100, 7)));
        balances
            .expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|user_id, points, _| *user_id == 1 && *points == 150)
            .returning(|user_id, points, at| Ok(Balance::new(user_id, points, at)));
        balances
            .expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|user_id, points, at| *user_id == 1 && *points == 100 && *at == 7)
            .returning(|user_id, points, at| Ok(Balance::new(user_id, points, at)));
        let mut history = MockHistoryPort::new();
        history.expect_append().times(1).returning(|_, _, _, _| {
            Err(crate::ports::history::Error::Adapter("log unavailable".into()))
        });
        let logic = DomainLogic::new(
            Arc::new(balances),
            Arc::new(history),
            ReadConsistency::Relaxed,
        );

        // WHEN charging
        let res = logic.commit(1, 50, TransactionKind::Charge).await;

        // THEN the call fails and the previous balance is written back
        assert_that!(res)
            .is_err()
            .matches(|err| err.kind() == ErrorKind::Unclassified);
    }

    #[tokio::test]
    async fn test_linearizable_read_registers_handle() {
        let logic = DomainLogic::new(
            Arc::new(MemoryBalanceStore::default()),
            Arc::new(MemoryHistoryStore::default()),
            ReadConsistency::Linearizable,
        );

        logic.read_balance(1).await.unwrap();
        logic.read_history(2).await.unwrap();

        // Read-only users keep a handle for the life of the ledger
        assert_that!(logic.locks().len()).is_equal_to(2);
    }

    #[rstest]
    #[tokio::test]
    async fn test_relaxed_read_registers_no_handle(
        logic: DomainLogic<MemoryBalanceStore, MemoryHistoryStore>,
    ) {
        logic.read_balance(1).await.unwrap();

        assert_that!(logic.locks().is_empty()).is_true();
    }

    #[tokio::test]
    async fn test_port_failure_is_unclassified() {
        let mut balances = MockBalancePort::new();
        balances.expect_read().returning(|_| {
            Err(crate::ports::balance::Error::Adapter(
                "store unavailable".into(),
            ))
        });
        let logic = DomainLogic::new(
            Arc::new(balances),
            Arc::new(MockHistoryPort::new()),
            ReadConsistency::Relaxed,
        );

        let res = logic.commit(1, 10, TransactionKind::Charge).await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.kind() == ErrorKind::Unclassified);
    }

    #[rstest]
    #[tokio::test]
    async fn test_balance_and_entry_share_timestamp(
        logic: DomainLogic<MemoryBalanceStore, MemoryHistoryStore>,
    ) {
        let balance = logic.commit(1, 300, TransactionKind::Charge).await.unwrap();
        let entries = logic.read_history(1).await.unwrap();

        assert_that!(entries).has_length(1);
        assert_that!(entries[0].timestamp_millis).is_equal_to(balance.updated_at_millis);
    }

    #[tokio::test]
    async fn test_timestamp_never_moves_backwards() {
        // GIVEN a balance last updated far in the future
        let balances = MemoryBalanceStore::default();
        let future = now_millis() + 60_000;
        balances.write(1, 10, future).await.unwrap();
        let logic = DomainLogic::new(
            Arc::new(balances),
            Arc::new(MemoryHistoryStore::default()),
            ReadConsistency::Relaxed,
        );

        // WHEN charging now
        let res = logic.commit(1, 5, TransactionKind::Charge).await;

        // THEN the update keeps the newer timestamp
        assert_that!(res)
            .is_ok()
            .matches(|balance| balance.points == 15 && balance.updated_at_millis == future);
    }

    #[tokio::test]
    async fn test_overflowing_charge_is_invalid() {
        let balances = MemoryBalanceStore::default();
        balances.write(1, i64::MAX, 0).await.unwrap();
        let logic = DomainLogic::new(
            Arc::new(balances),
            Arc::new(MemoryHistoryStore::default()),
            ReadConsistency::Relaxed,
        );

        let res = logic.commit(1, 1, TransactionKind::Charge).await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.kind() == ErrorKind::InvalidAmount);
        assert_that!(logic.read_history(1).await).is_ok().is_empty();
    }

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidAmount {
            kind: TransactionKind::Use,
            amount: -1,
        };
        assert_that!(err.to_string()).is_equal_to("cannot use a negative amount: -1".to_string());

        let err = Error::InsufficientBalance {
            current_points: 200,
            amount: 300,
        };
        assert_that!(err.to_string())
            .is_equal_to("not enough points: 200 available, 300 requested".to_string());
    }
}
