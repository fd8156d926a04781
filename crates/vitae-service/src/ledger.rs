//! The credit ledger service.
//!
//! Sole writer-of-record for balances and purchase records: handlers never
//! touch the store's mutation paths directly, they go through this facade.
//! Insufficient funds and duplicate gateway callbacks are normal outcomes
//! surfaced through [`DebitResult`] and [`FinalizeResult`]; errors are
//! reserved for unknown references and storage failures.

use std::sync::Arc;

use vitae_core::{
    CreditBalance, CreditPackage, CreditTransaction, Feature, PurchaseId, PurchaseOutcome,
    PurchaseRecord, UserId,
};
use vitae_store::{DebitResult, FinalizeResult, Result, RocksStore, Store};

/// The credit ledger service.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<RocksStore>,
}

impl Ledger {
    /// Create a ledger over the given store.
    #[must_use]
    pub fn new(store: Arc<RocksStore>) -> Self {
        Self { store }
    }

    /// Current balance for a user; 0 for a user with no balance record.
    ///
    /// An idempotent read: it never creates a record and never fails for an
    /// unknown user.
    pub fn balance(&self, user_id: &UserId) -> Result<i64> {
        Ok(self.store.get_balance(user_id)?.map_or(0, |b| b.balance))
    }

    /// Check whether a user's balance covers a required amount.
    ///
    /// A user without a record is checked against a zero balance.
    pub fn has_sufficient_credits(&self, user_id: &UserId, required: i64) -> Result<bool> {
        let balance = self
            .store
            .get_balance(user_id)?
            .unwrap_or_else(|| CreditBalance::new(*user_id));

        Ok(balance.has_sufficient_credits(required))
    }

    /// Open a pending purchase for a catalog package.
    ///
    /// The balance is untouched; only the gateway callback can complete the
    /// purchase and credit it.
    pub fn create_purchase(
        &self,
        user_id: UserId,
        package: &CreditPackage,
    ) -> Result<PurchaseRecord> {
        let purchase = PurchaseRecord::new(user_id, package.credits, package.price_cents);
        self.store.put_purchase(&purchase)?;

        tracing::info!(
            user_id = %user_id,
            purchase_id = %purchase.id,
            package = %package.id,
            credits = %package.credits,
            price_cents = %package.price_cents,
            "Purchase created"
        );

        Ok(purchase)
    }

    /// Look up a purchase record.
    pub fn purchase(&self, purchase_id: &PurchaseId) -> Result<Option<PurchaseRecord>> {
        self.store.get_purchase(purchase_id)
    }

    /// Finalize a pending purchase from a verified gateway callback.
    ///
    /// Idempotent under duplicate callbacks: an already terminal record
    /// reports [`FinalizeResult::AlreadyFinal`] and nothing changes.
    pub fn finalize_purchase(
        &self,
        purchase_id: &PurchaseId,
        external_payment_id: &str,
        outcome: PurchaseOutcome,
    ) -> Result<FinalizeResult> {
        let result = self
            .store
            .finalize_purchase(purchase_id, external_payment_id, outcome)?;

        match result {
            FinalizeResult::Credited { new_balance } => {
                tracing::info!(
                    purchase_id = %purchase_id,
                    external_payment_id = %external_payment_id,
                    new_balance = %new_balance,
                    "Purchase completed, balance credited"
                );
            }
            FinalizeResult::MarkedFailed => {
                tracing::info!(
                    purchase_id = %purchase_id,
                    external_payment_id = %external_payment_id,
                    "Purchase marked failed"
                );
            }
            FinalizeResult::AlreadyFinal => {
                tracing::warn!(
                    purchase_id = %purchase_id,
                    "Duplicate finalization attempt ignored"
                );
            }
        }

        Ok(result)
    }

    /// Debit the cost of a feature invocation.
    ///
    /// Insufficient balance reports [`DebitResult::Insufficient`] without
    /// mutating anything.
    pub fn debit_feature(&self, user_id: &UserId, feature: Feature) -> Result<DebitResult> {
        let result =
            self.store
                .debit_credits(user_id, feature.credit_cost(), feature.display_name())?;

        if let DebitResult::Debited { new_balance } = result {
            tracing::info!(
                user_id = %user_id,
                feature = ?feature,
                cost = %feature.credit_cost(),
                new_balance = %new_balance,
                "Feature usage debited"
            );
        }

        Ok(result)
    }

    /// List a user's transaction history, newest first.
    pub fn transactions(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        self.store.list_transactions_by_user(user_id, limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vitae_core::find_package;
    use vitae_store::StoreError;

    fn create_test_ledger() -> (Ledger, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (Ledger::new(Arc::new(store)), dir)
    }

    #[test]
    fn fresh_user_balance_is_zero() {
        let (ledger, _dir) = create_test_ledger();
        let user_id = UserId::generate();

        assert_eq!(ledger.balance(&user_id).unwrap(), 0);
        assert!(!ledger.has_sufficient_credits(&user_id, 30).unwrap());
        assert!(ledger.has_sufficient_credits(&user_id, 0).unwrap());
    }

    #[test]
    fn sufficiency_check_is_exact_at_the_boundary() {
        let (ledger, _dir) = create_test_ledger();
        let user_id = UserId::generate();
        let package = find_package("starter").unwrap();
        let purchase = ledger.create_purchase(user_id, package).unwrap();
        ledger
            .finalize_purchase(&purchase.id, "pf_1", PurchaseOutcome::Completed)
            .unwrap();

        assert!(ledger.has_sufficient_credits(&user_id, 49).unwrap());
        assert!(ledger.has_sufficient_credits(&user_id, 50).unwrap());
        assert!(!ledger.has_sufficient_credits(&user_id, 51).unwrap());
    }

    #[test]
    fn create_purchase_does_not_credit() {
        let (ledger, _dir) = create_test_ledger();
        let user_id = UserId::generate();
        let package = find_package("starter").unwrap();

        let purchase = ledger.create_purchase(user_id, package).unwrap();
        assert_eq!(purchase.credits, 50);
        assert_eq!(ledger.balance(&user_id).unwrap(), 0);

        let stored = ledger.purchase(&purchase.id).unwrap().unwrap();
        assert_eq!(stored.id, purchase.id);
    }

    #[test]
    fn purchase_lifecycle_scenario() {
        // Full user journey: empty balance, gate refusal, purchase,
        // callback completion, gate pass, consumption.
        let (ledger, _dir) = create_test_ledger();
        let user_id = UserId::generate();

        assert!(!ledger.has_sufficient_credits(&user_id, 30).unwrap());

        let package = find_package("starter").unwrap();
        let purchase = ledger.create_purchase(user_id, package).unwrap();

        let result = ledger
            .finalize_purchase(&purchase.id, "pf_1001", PurchaseOutcome::Completed)
            .unwrap();
        assert_eq!(result, FinalizeResult::Credited { new_balance: 50 });

        assert_eq!(ledger.balance(&user_id).unwrap(), 50);
        assert!(ledger.has_sufficient_credits(&user_id, 30).unwrap());

        let debit = ledger
            .debit_feature(&user_id, Feature::InterviewSession)
            .unwrap();
        assert_eq!(debit, DebitResult::Debited { new_balance: 20 });
        assert_eq!(ledger.balance(&user_id).unwrap(), 20);
    }

    #[test]
    fn duplicate_finalization_credits_once() {
        let (ledger, _dir) = create_test_ledger();
        let user_id = UserId::generate();
        let package = find_package("starter").unwrap();
        let purchase = ledger.create_purchase(user_id, package).unwrap();

        ledger
            .finalize_purchase(&purchase.id, "pf_1001", PurchaseOutcome::Completed)
            .unwrap();
        let second = ledger
            .finalize_purchase(&purchase.id, "pf_1001", PurchaseOutcome::Completed)
            .unwrap();

        assert_eq!(second, FinalizeResult::AlreadyFinal);
        assert_eq!(ledger.balance(&user_id).unwrap(), 50);
    }

    #[test]
    fn finalize_unknown_purchase_errors() {
        let (ledger, _dir) = create_test_ledger();
        let unknown = PurchaseId::generate();

        let result = ledger.finalize_purchase(&unknown, "pf_1", PurchaseOutcome::Completed);
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn debit_sequence_never_goes_negative() {
        let (ledger, _dir) = create_test_ledger();
        let user_id = UserId::generate();
        let package = find_package("starter").unwrap();
        let purchase = ledger.create_purchase(user_id, package).unwrap();
        ledger
            .finalize_purchase(&purchase.id, "pf_1", PurchaseOutcome::Completed)
            .unwrap();

        // 50 credits buys one interview session (30) but not two.
        assert_eq!(
            ledger
                .debit_feature(&user_id, Feature::InterviewSession)
                .unwrap(),
            DebitResult::Debited { new_balance: 20 }
        );
        assert_eq!(
            ledger
                .debit_feature(&user_id, Feature::InterviewSession)
                .unwrap(),
            DebitResult::Insufficient { balance: 20 }
        );
        assert_eq!(ledger.balance(&user_id).unwrap(), 20);

        // A cheaper feature still fits.
        assert_eq!(
            ledger
                .debit_feature(&user_id, Feature::CvGeneration)
                .unwrap(),
            DebitResult::Debited { new_balance: 10 }
        );
    }

    #[test]
    fn history_reflects_ledger_activity() {
        let (ledger, _dir) = create_test_ledger();
        let user_id = UserId::generate();
        let package = find_package("starter").unwrap();
        let purchase = ledger.create_purchase(user_id, package).unwrap();
        ledger
            .finalize_purchase(&purchase.id, "pf_1", PurchaseOutcome::Completed)
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs
        ledger
            .debit_feature(&user_id, Feature::CvGeneration)
            .unwrap();

        let history = ledger.transactions(&user_id, 10, 0).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, -10);
        assert_eq!(history[1].amount, 50);
    }
}
