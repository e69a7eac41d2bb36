use crate::domain::{Balance, UserId};

#[mockall::automock]
#[async_trait::async_trait]
pub trait BalancePort: Send + Sync {
    /// Current balance of a user
    ///
    /// Users that were never written get a zero balance, which is not stored.
    async fn read(&self, user_id: UserId) -> Result<Balance, Error>;

    /// Overwrite the balance of a user
    ///
    /// This does not check the value of `points`. Keeping it non-negative and serializing
    /// concurrent writers is up to the caller.
    async fn write(
        &self,
        user_id: UserId,
        points: i64,
        updated_at_millis: i64,
    ) -> Result<Balance, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure inside the backing store, e.g. a poisoned table
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
