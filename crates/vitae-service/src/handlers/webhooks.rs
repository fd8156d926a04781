//! Payment gateway callback handler.
//!
//! The gateway POSTs a form-encoded notification after the hosted payment
//! page settles (or fails) a purchase. This is the only path that credits
//! a balance. Everything in the payload is untrusted until the signature
//! verifies, and the credits applied always come from our own purchase
//! record, never from the payload.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::State;
use axum::{Form, Json};
use serde::Serialize;

use vitae_core::{PurchaseId, PurchaseOutcome};
use vitae_store::FinalizeResult;

use crate::error::ApiError;
use crate::gateway::{FIELD_CREDITS, FIELD_PURCHASE_ID};
use crate::state::AppState;

/// Gateway payment status value indicating a settled payment.
const STATUS_COMPLETE: &str = "COMPLETE";

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the notification was accepted.
    pub received: bool,
    /// Whether the ledger changed as a result. False for a duplicate
    /// notification about an already-finalized purchase.
    pub applied: bool,
}

/// Handle a payment notification from the gateway.
///
/// Duplicate notifications are acknowledged with 200 so the gateway stops
/// retrying, but the purchase is only ever credited once.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let gateway = state
        .gateway
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Payment gateway not configured".into()))?;

    if !gateway.verify_callback(&fields) {
        tracing::warn!("Payment webhook rejected: invalid signature");
        return Err(ApiError::BadRequest("Invalid signature".into()));
    }

    let purchase_id = fields
        .get(FIELD_PURCHASE_ID)
        .ok_or_else(|| ApiError::BadRequest("Missing purchase reference".into()))
        .and_then(|raw| {
            PurchaseId::from_str(raw)
                .map_err(|_| ApiError::BadRequest("Malformed purchase reference".into()))
        })?;

    let credits_echo: i64 = fields
        .get(FIELD_CREDITS)
        .ok_or_else(|| ApiError::BadRequest("Missing credits field".into()))
        .and_then(|raw| {
            raw.parse()
                .map_err(|_| ApiError::BadRequest("Malformed credits field".into()))
        })?;

    let payment_status = fields
        .get("payment_status")
        .ok_or_else(|| ApiError::BadRequest("Missing payment status".into()))?;

    let external_payment_id = fields
        .get("pf_payment_id")
        .map_or("unknown", String::as_str);

    let purchase = state
        .ledger
        .purchase(&purchase_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Purchase not found: {purchase_id}")))?;

    // The echoed credit quantity must match our own record. A mismatch means
    // the fields were tampered with in flight (and somehow re-signed) or the
    // gateway config is inconsistent; either way the purchase stays pending
    // for manual inspection.
    if credits_echo != purchase.credits {
        tracing::warn!(
            purchase_id = %purchase_id,
            expected = purchase.credits,
            received = credits_echo,
            "Payment webhook rejected: credit quantity mismatch"
        );
        return Err(ApiError::BadRequest("Credit quantity mismatch".into()));
    }

    let outcome = if payment_status == STATUS_COMPLETE {
        PurchaseOutcome::Completed
    } else {
        tracing::info!(
            purchase_id = %purchase_id,
            payment_status = %payment_status,
            "Payment not completed, marking purchase failed"
        );
        PurchaseOutcome::Failed
    };

    let result = state
        .ledger
        .finalize_purchase(&purchase_id, external_payment_id, outcome)?;

    let applied = !matches!(result, FinalizeResult::AlreadyFinal);

    Ok(Json(WebhookResponse {
        received: true,
        applied,
    }))
}
