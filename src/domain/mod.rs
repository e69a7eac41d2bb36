use serde::{Deserialize, Serialize};

/// Identifier of a user owning a point balance
pub type UserId = u64;

/// Identifier of a [`HistoryEntry`]
///
/// Assigned in global insertion order across all users.
pub type EntryId = u64;

/// Current point balance of a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub user_id: UserId,

    /// Current amount of points
    ///
    /// This is never negative once committed through the ledger.
    pub points: i64,

    /// Unix timestamp in milliseconds of the last mutation
    ///
    /// `0` for a user that was never written.
    pub updated_at_millis: i64,
}

impl Balance {
    pub fn new(user_id: UserId, points: i64, updated_at_millis: i64) -> Self {
        Self {
            user_id,
            points,
            updated_at_millis,
        }
    }

    /// Zero balance for a user that has never been written
    pub fn empty(user_id: UserId) -> Self {
        Self::new(user_id, 0, 0)
    }
}

/// Direction of a point transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Points credited to the user
    Charge,
    /// Points debited from the user
    Use,
}

impl TransactionKind {
    /// Apply a transaction of this kind to `points`
    ///
    /// Returns `None` if the result would overflow or become negative.
    pub fn apply(&self, points: i64, amount: i64) -> Option<i64> {
        match self {
            TransactionKind::Charge => points.checked_add(amount),
            TransactionKind::Use => points.checked_sub(amount).filter(|p| *p >= 0),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            TransactionKind::Charge => "charge",
            TransactionKind::Use => "use",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Charge => f.write_str("CHARGE"),
            TransactionKind::Use => f.write_str("USE"),
        }
    }
}

/// Immutable record of one committed charge or use
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub entry_id: EntryId,
    pub user_id: UserId,
    /// Magnitude of the transaction
    ///
    /// The direction is carried by `kind`, so this is never negative.
    pub amount: i64,
    pub kind: TransactionKind,
    /// Unix timestamp in milliseconds, identical to the matching balance update
    pub timestamp_millis: i64,
}

/// Current wall-clock time as Unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
