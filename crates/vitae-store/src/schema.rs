//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Credit balance records, keyed by `user_id`.
    pub const BALANCES: &str = "balances";

    /// Purchase records, keyed by `purchase_id`.
    pub const PURCHASES: &str = "purchases";

    /// Credit transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::BALANCES,
        cf::PURCHASES,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
    ]
}
