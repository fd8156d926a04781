//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use vitae_core::{
    CreditBalance, CreditTransaction, PurchaseId, PurchaseOutcome, PurchaseRecord, TransactionId,
    UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{DebitResult, FinalizeResult, Store};

/// RocksDB-backed storage implementation.
///
/// All mutations go through `write_lock`, so the read-modify-write sequence
/// inside `finalize_purchase` and `debit_credits` observes a consistent
/// balance and commits as one `WriteBatch`.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Acquire the mutation lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Stage a transaction and its user index entry on a batch.
    fn stage_transaction(
        &self,
        batch: &mut WriteBatch,
        transaction: &CreditTransaction,
    ) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let tx_key = keys::transaction_key(&transaction.id);
        let user_tx_key = keys::user_transaction_key(&transaction.user_id, &transaction.id);
        let value = Self::serialize(transaction)?;

        batch.put_cf(&cf_tx, &tx_key, &value);
        batch.put_cf(&cf_by_user, &user_tx_key, []); // Index entry (empty value)

        Ok(())
    }

    /// Stage a balance record on a batch.
    fn stage_balance(&self, batch: &mut WriteBatch, balance: &CreditBalance) -> Result<()> {
        let cf_balances = self.cf(cf::BALANCES)?;
        let key = keys::balance_key(&balance.user_id);
        let value = Self::serialize(balance)?;
        batch.put_cf(&cf_balances, &key, &value);
        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Balance Operations
    // =========================================================================

    fn get_balance(&self, user_id: &UserId) -> Result<Option<CreditBalance>> {
        let cf = self.cf(cf::BALANCES)?;
        let key = keys::balance_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn debit_credits(
        &self,
        user_id: &UserId,
        amount: i64,
        description: &str,
    ) -> Result<DebitResult> {
        let _guard = self.lock()?;

        // A user without a record has zero credits; any positive debit is
        // refused without creating one.
        let mut balance = match self.get_balance(user_id)? {
            Some(balance) => balance,
            None => return Ok(DebitResult::Insufficient { balance: 0 }),
        };

        if balance.balance < amount {
            return Ok(DebitResult::Insufficient {
                balance: balance.balance,
            });
        }

        balance.balance -= amount;
        balance.updated_at = chrono::Utc::now();

        let transaction = CreditTransaction::feature_usage(
            *user_id,
            amount,
            balance.balance,
            description.to_string(),
        );

        let mut batch = WriteBatch::default();
        self.stage_balance(&mut batch, &balance)?;
        self.stage_transaction(&mut batch, &transaction)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(DebitResult::Debited {
            new_balance: balance.balance,
        })
    }

    // =========================================================================
    // Purchase Operations
    // =========================================================================

    fn put_purchase(&self, purchase: &PurchaseRecord) -> Result<()> {
        let cf = self.cf(cf::PURCHASES)?;
        let key = keys::purchase_key(&purchase.id);
        let value = Self::serialize(purchase)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<PurchaseRecord>> {
        let cf = self.cf(cf::PURCHASES)?;
        let key = keys::purchase_key(purchase_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn finalize_purchase(
        &self,
        purchase_id: &PurchaseId,
        external_payment_id: &str,
        outcome: PurchaseOutcome,
    ) -> Result<FinalizeResult> {
        let _guard = self.lock()?;

        let mut purchase = self
            .get_purchase(purchase_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "purchase",
                id: purchase_id.to_string(),
            })?;

        // Terminal states admit no further transitions; a duplicate callback
        // must not credit a second time.
        if purchase.is_terminal() {
            return Ok(FinalizeResult::AlreadyFinal);
        }

        let now = chrono::Utc::now();
        purchase.status = outcome.terminal_status();
        purchase.external_payment_id = Some(external_payment_id.to_string());
        purchase.finalized_at = Some(now);

        let cf_purchases = self.cf(cf::PURCHASES)?;
        let purchase_key = keys::purchase_key(purchase_id);
        let purchase_value = Self::serialize(&purchase)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_purchases, &purchase_key, &purchase_value);

        let result = if outcome == PurchaseOutcome::Completed {
            let mut balance = self
                .get_balance(&purchase.user_id)?
                .unwrap_or_else(|| CreditBalance::new(purchase.user_id));

            balance.balance += purchase.credits;
            balance.updated_at = now;

            let transaction = CreditTransaction::purchase(
                purchase.user_id,
                &purchase.id,
                purchase.credits,
                balance.balance,
            );

            self.stage_balance(&mut batch, &balance)?;
            self.stage_transaction(&mut batch, &transaction)?;

            FinalizeResult::Credited {
                new_balance: balance.balance,
            }
        } else {
            FinalizeResult::MarkedFailed
        };

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result)
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let key = keys::transaction_key(transaction_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // Collect matching keys first; ULIDs are naturally time-ordered, so
        // reversing yields newest-first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }

        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }

            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }
}
