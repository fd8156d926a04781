//! `RocksDB` storage layer for the vitae credit ledger.
//!
//! This crate provides persistent storage for credit balances, purchase
//! records, and the transaction history, using `RocksDB` with column
//! families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `balances`: Credit balance records, keyed by `user_id`
//! - `purchases`: Purchase records, keyed by `purchase_id`
//! - `transactions`: Credit transactions, keyed by `transaction_id` (ULID)
//! - `transactions_by_user`: Index for listing transactions by user
//!
//! # Atomicity
//!
//! The compound operations (`finalize_purchase`, `debit_credits`) are the
//! correctness-critical part of the ledger: a duplicate gateway callback must
//! not credit twice and concurrent debits must not overdraw. Both are
//! executed as a single read-modify-write under the store's write lock and
//! committed in one `WriteBatch`.
//!
//! # Example
//!
//! ```no_run
//! use vitae_store::{RocksStore, Store};
//! use vitae_core::{PurchaseRecord, UserId};
//!
//! let store = RocksStore::open("/tmp/vitae-ledger").unwrap();
//!
//! let user_id = UserId::generate();
//! let purchase = PurchaseRecord::new(user_id, 50, 9900);
//! store.put_purchase(&purchase).unwrap();
//!
//! // A user with no balance record reads as zero.
//! let balance = store.get_balance(&user_id).unwrap();
//! assert!(balance.is_none());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use vitae_core::{
    CreditBalance, CreditTransaction, PurchaseId, PurchaseOutcome, PurchaseRecord, TransactionId,
    UserId,
};

/// Result of finalizing a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeResult {
    /// The purchase completed and the balance was credited.
    Credited {
        /// Balance after the credit was applied.
        new_balance: i64,
    },

    /// The purchase was marked failed; the balance is untouched.
    MarkedFailed,

    /// The purchase was already terminal; nothing changed.
    AlreadyFinal,
}

/// Result of a debit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitResult {
    /// Credits were deducted.
    Debited {
        /// Balance after the deduction.
        new_balance: i64,
    },

    /// The balance does not cover the amount; nothing changed.
    Insufficient {
        /// The current (unchanged) balance.
        balance: i64,
    },
}

/// The storage trait defining all ledger database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations behind the same ledger contract.
pub trait Store: Send + Sync {
    // =========================================================================
    // Balance Operations
    // =========================================================================

    /// Get the balance record for a user.
    ///
    /// Returns `None` for a user with no record; callers treat that as a
    /// zero balance. Reading never creates a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_balance(&self, user_id: &UserId) -> Result<Option<CreditBalance>>;

    /// Deduct credits from a user's balance atomically, recording a usage
    /// transaction.
    ///
    /// Insufficient balance is a normal outcome reported through
    /// [`DebitResult::Insufficient`], not an error. A user with no balance
    /// record is treated as having zero credits.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn debit_credits(&self, user_id: &UserId, amount: i64, description: &str)
        -> Result<DebitResult>;

    // =========================================================================
    // Purchase Operations
    // =========================================================================

    /// Insert a new purchase record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_purchase(&self, purchase: &PurchaseRecord) -> Result<()>;

    /// Get a purchase by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<PurchaseRecord>>;

    /// Finalize a pending purchase atomically.
    ///
    /// Transitions the record into the outcome's terminal status and records
    /// the gateway's payment identifier. Only a `Completed` outcome credits
    /// the balance (creating the balance record if absent) and appends a
    /// purchase transaction. An already terminal record yields
    /// [`FinalizeResult::AlreadyFinal`] with no side effects, which makes
    /// duplicate gateway callbacks idempotent.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the purchase doesn't exist.
    /// - `StoreError::Database` / `StoreError::Serialization` on
    ///   infrastructure failure.
    fn finalize_purchase(
        &self,
        purchase_id: &PurchaseId,
        external_payment_id: &str,
        outcome: PurchaseOutcome,
    ) -> Result<FinalizeResult>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>>;

    /// List transactions for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>>;
}
