//! Credit balance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user's credit balance.
///
/// One record per user, created lazily on the first balance mutation.
/// A balance query for a user with no record reads as zero; querying
/// never creates a record. The balance is never negative: debits that
/// would underflow are refused before any write happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditBalance {
    /// The user who owns this balance.
    pub user_id: UserId,

    /// Current balance in whole credits.
    pub balance: i64,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CreditBalance {
    /// Create a new balance record with zero credits.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the balance covers a required amount.
    #[must_use]
    pub fn has_sufficient_credits(&self, required: i64) -> bool {
        self.balance >= required
    }
}
