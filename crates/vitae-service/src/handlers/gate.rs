//! Feature gate handlers.
//!
//! Called service-to-service by the feature backends before and after
//! running a paid feature. `check` is advisory; `consume` is the
//! authoritative debit and is the only place credits leave a balance.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vitae_core::Feature;
use vitae_store::DebitResult;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Gate request body.
#[derive(Debug, Deserialize)]
pub struct GateRequest {
    /// The user whose balance is being gated.
    pub user_id: vitae_core::UserId,
    /// The feature being invoked.
    pub feature: Feature,
}

/// Check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    /// Whether the user can currently afford the feature.
    pub allowed: bool,
    /// Current balance.
    pub balance: i64,
    /// Credits the feature costs.
    pub required: i64,
}

/// Check whether a user can afford a feature without charging them.
pub async fn check(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<GateRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let required = body.feature.credit_cost();
    let balance = state.ledger.balance(&body.user_id)?;
    let allowed = balance >= required;

    tracing::debug!(
        caller = %auth.service_name,
        user_id = %body.user_id,
        feature = ?body.feature,
        allowed,
        "Gate check"
    );

    Ok(Json(CheckResponse {
        allowed,
        balance,
        required,
    }))
}

/// Consume response.
#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    /// Balance after the debit.
    pub balance: i64,
    /// Credits charged.
    pub charged: i64,
}

/// Charge a user for a feature invocation.
///
/// Returns 402 when the balance does not cover the cost; the balance is
/// left untouched in that case.
pub async fn consume(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<GateRequest>,
) -> Result<Json<ConsumeResponse>, ApiError> {
    let required = body.feature.credit_cost();

    match state.ledger.debit_feature(&body.user_id, body.feature)? {
        DebitResult::Debited { new_balance } => Ok(Json(ConsumeResponse {
            balance: new_balance,
            charged: required,
        })),
        DebitResult::Insufficient { balance } => {
            tracing::info!(
                caller = %auth.service_name,
                user_id = %body.user_id,
                feature = ?body.feature,
                balance,
                required,
                "Feature charge refused"
            );
            Err(ApiError::InsufficientCredits { balance, required })
        }
    }
}
