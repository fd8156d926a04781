//! Credit transaction types.
//!
//! Every balance change appends a transaction record, giving each user an
//! auditable history. Transactions use ULIDs for time-ordered IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PurchaseId, TransactionId, UserId};

/// A credit transaction representing one balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Amount in credits. Positive = credit, negative = debit.
    pub amount: i64,

    /// Type of transaction.
    pub transaction_type: TransactionType,

    /// Balance after this transaction.
    pub balance_after: i64,

    /// Human-readable description.
    pub description: String,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// Create a transaction for a completed purchase.
    #[must_use]
    pub fn purchase(
        user_id: UserId,
        purchase_id: &PurchaseId,
        amount: i64,
        balance_after: i64,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount,
            transaction_type: TransactionType::Purchase,
            balance_after,
            description: format!("Purchased {amount} credits (purchase {purchase_id})"),
            created_at: Utc::now(),
        }
    }

    /// Create a transaction for feature consumption (deduction).
    #[must_use]
    pub fn feature_usage(
        user_id: UserId,
        amount: i64,
        balance_after: i64,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount: -amount.abs(), // Always negative for usage
            transaction_type: TransactionType::FeatureUsage,
            balance_after,
            description,
            created_at: Utc::now(),
        }
    }
}

/// Type of credit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credits added by a completed purchase.
    Purchase,

    /// Credits deducted for a paid feature invocation.
    FeatureUsage,
}

impl TransactionType {
    /// Check if this transaction type adds credits.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Purchase)
    }

    /// Check if this transaction type removes credits.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::FeatureUsage)
    }
}
