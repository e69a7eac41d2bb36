use crate::domain::{HistoryEntry, TransactionKind, UserId};

#[mockall::automock]
#[async_trait::async_trait]
pub trait HistoryPort: Send + Sync {
    /// Record a committed transaction, assigning it the next entry id
    async fn append(
        &self,
        user_id: UserId,
        amount: i64,
        kind: TransactionKind,
        timestamp_millis: i64,
    ) -> Result<HistoryEntry, Error>;

    /// All entries of a user, in insertion order
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure inside the backing log
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
