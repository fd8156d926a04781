//! Credit balance, history, catalog, and checkout handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use vitae_core::{find_package, CreditTransaction, Feature, TransactionType, PACKAGES};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::gateway::CheckoutRequest;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current balance in credits.
    pub balance: i64,
}

/// Get current credit balance.
///
/// A user who has never purchased reads as zero; this endpoint never 404s
/// for an authenticated caller.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.ledger.balance(&auth.user_id)?;

    Ok(Json(BalanceResponse { balance }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Amount in credits (positive = credit, negative = debit).
    pub amount: i64,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Balance after this transaction.
    pub balance_after: i64,
    /// Description.
    pub description: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&CreditTransaction> for TransactionResponse {
    fn from(tx: &CreditTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            amount: tx.amount,
            transaction_type: tx.transaction_type,
            balance_after: tx.balance_after,
            description: tx.description.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let transactions = state
        .ledger
        .transactions(&auth.user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Catalog package response.
#[derive(Debug, Serialize)]
pub struct PackageResponse {
    /// Catalog identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Credit quantity.
    pub credits: i64,
    /// Price in cents.
    pub price_cents: i64,
}

/// List the static credit package catalog.
pub async fn list_packages(_auth: AuthUser) -> Json<Vec<PackageResponse>> {
    let packages = PACKAGES
        .iter()
        .map(|p| PackageResponse {
            id: p.id,
            name: p.name,
            credits: p.credits,
            price_cents: p.price_cents,
        })
        .collect();

    Json(packages)
}

/// Feature cost response.
#[derive(Debug, Serialize)]
pub struct FeatureCostResponse {
    /// The feature.
    pub feature: Feature,
    /// Credit cost per invocation.
    pub cost: i64,
}

/// List the static feature cost table.
pub async fn list_costs(_auth: AuthUser) -> Json<Vec<FeatureCostResponse>> {
    let costs = Feature::all()
        .iter()
        .map(|&feature| FeatureCostResponse {
            feature,
            cost: feature.credit_cost(),
        })
        .collect();

    Json(costs)
}

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    /// Catalog identifier of the package to purchase.
    pub package_id: String,
}

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// The pending purchase identifier.
    pub purchase_id: String,
    /// The prepared gateway checkout (redirect URL and signed fields).
    #[serde(flatten)]
    pub checkout: CheckoutRequest,
}

/// Initiate a credit purchase.
///
/// Opens a pending purchase record and returns the signed redirect for the
/// gateway's hosted payment page. The balance is only credited later, when
/// the gateway's callback confirms settlement.
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let package = find_package(&body.package_id).ok_or_else(|| {
        ApiError::BadRequest(format!("unknown credit package: {}", body.package_id))
    })?;

    let gateway = state
        .gateway
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Payment gateway not configured".into()))?;

    let purchase = state.ledger.create_purchase(auth.user_id, package)?;

    let checkout = gateway.build_checkout_request(
        &purchase,
        auth.email.as_deref().unwrap_or_default(),
        auth.name.as_deref().unwrap_or_default(),
    );

    tracing::info!(
        user_id = %auth.user_id,
        purchase_id = %purchase.id,
        package = %package.id,
        "Checkout prepared"
    );

    Ok(Json(CheckoutResponse {
        purchase_id: purchase.id.to_string(),
        checkout,
    }))
}
