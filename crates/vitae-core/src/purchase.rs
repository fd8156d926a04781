//! Purchase records and their state machine.
//!
//! A purchase tracks one attempt to convert a money payment into credits.
//! It is created `pending` when checkout is initiated and finalized exactly
//! once by the payment gateway's callback. The transition into `completed`
//! is the single admission gate for crediting the balance: a record that is
//! already terminal must never drive another credit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PurchaseId, UserId};

/// One attempted credit top-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Unique purchase identifier, generated at creation.
    pub id: PurchaseId,

    /// The purchasing user.
    pub user_id: UserId,

    /// Credit quantity this purchase buys.
    pub credits: i64,

    /// Price in cents of the settlement currency.
    pub price_cents: i64,

    /// The gateway's payment identifier, set by the callback.
    pub external_payment_id: Option<String>,

    /// Current state of the purchase.
    pub status: PurchaseStatus,

    /// When the purchase was created.
    pub created_at: DateTime<Utc>,

    /// When the purchase reached a terminal state.
    pub finalized_at: Option<DateTime<Utc>>,
}

impl PurchaseRecord {
    /// Create a new pending purchase with a fresh identifier.
    #[must_use]
    pub fn new(user_id: UserId, credits: i64, price_cents: i64) -> Self {
        Self {
            id: PurchaseId::generate(),
            user_id,
            credits,
            price_cents,
            external_payment_id: None,
            status: PurchaseStatus::Pending,
            created_at: Utc::now(),
            finalized_at: None,
        }
    }

    /// Check if the purchase is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            PurchaseStatus::Completed | PurchaseStatus::Failed
        )
    }
}

/// State of a purchase record.
///
/// `Pending` is the only non-terminal state; `Completed` and `Failed`
/// admit no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Checkout initiated, awaiting the gateway callback.
    Pending,

    /// Payment settled; the balance was credited.
    Completed,

    /// Payment did not settle (cancelled, declined).
    Failed,
}

/// Outcome reported by a verified gateway callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// The payment settled successfully.
    Completed,

    /// The payment failed or was cancelled.
    Failed,
}

impl PurchaseOutcome {
    /// The terminal status this outcome transitions a pending purchase into.
    #[must_use]
    pub const fn terminal_status(self) -> PurchaseStatus {
        match self {
            Self::Completed => PurchaseStatus::Completed,
            Self::Failed => PurchaseStatus::Failed,
        }
    }
}
