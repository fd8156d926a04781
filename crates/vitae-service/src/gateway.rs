//! Payment gateway adapter.
//!
//! Translates between the ledger's purchase records and the external payment
//! processor's wire format. The gateway hosts the payment page: we redirect
//! the user there with a signed form-field set and later receive a signed
//! server-to-server callback confirming (or denying) the payment.
//!
//! # Signature scheme
//!
//! Both directions sign the same way: take every field except `signature`,
//! sort by field name, render as a form-urlencoded string, and compute
//! HMAC-SHA256 with the shared passphrase, hex-encoded. Verification uses a
//! constant-time comparison and never errors - a forged or malformed callback
//! is expected adversarial input and simply reports as invalid.

use std::collections::BTreeMap;

use vitae_core::PurchaseRecord;

use crate::crypto::{constant_time_eq, hmac_sha256_hex};

/// Field name carrying the signature on the wire.
const SIGNATURE_FIELD: &str = "signature";

/// Echo field carrying our purchase identifier.
pub const FIELD_PURCHASE_ID: &str = "custom_str1";

/// Echo field carrying the purchased credit quantity.
pub const FIELD_CREDITS: &str = "custom_str2";

/// Configuration for the payment gateway adapter.
///
/// Constructed explicitly from the service configuration at startup and
/// passed into [`PaymentGateway::new`]; the adapter never reads ambient
/// environment state.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Merchant account identifier.
    pub merchant_id: String,

    /// Merchant key, sent with checkout requests.
    pub merchant_key: String,

    /// Shared passphrase used to sign and verify. Without it the adapter
    /// refuses to validate callbacks.
    pub passphrase: Option<String>,

    /// URL of the gateway's hosted payment page.
    pub process_url: String,

    /// Where the gateway sends the payer after a successful payment.
    pub return_url: String,

    /// Where the gateway sends the payer after cancelling.
    pub cancel_url: String,

    /// Our webhook endpoint for the asynchronous payment notification.
    pub notify_url: String,
}

/// A prepared checkout: the hosted-page redirect plus the signed fields.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutRequest {
    /// Full redirect URL including the signed query string.
    pub redirect_url: String,

    /// The signed form fields, in the order they were signed.
    pub fields: Vec<(String, String)>,
}

/// The payment gateway adapter.
#[derive(Debug, Clone)]
pub struct PaymentGateway {
    config: GatewayConfig,
}

impl PaymentGateway {
    /// Create a new adapter from an explicit configuration.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Build a signed checkout request for a pending purchase.
    ///
    /// The purchase identifier and credit quantity ride along as opaque
    /// custom fields the gateway echoes back in its callback; the callback
    /// handler uses them to locate the record and cross-check the quantity.
    #[must_use]
    pub fn build_checkout_request(
        &self,
        purchase: &PurchaseRecord,
        payer_email: &str,
        payer_name: &str,
    ) -> CheckoutRequest {
        let mut fields: Vec<(String, String)> = vec![
            ("merchant_id".into(), self.config.merchant_id.clone()),
            ("merchant_key".into(), self.config.merchant_key.clone()),
            ("return_url".into(), self.config.return_url.clone()),
            ("cancel_url".into(), self.config.cancel_url.clone()),
            ("notify_url".into(), self.config.notify_url.clone()),
            ("name_first".into(), payer_name.to_string()),
            ("email_address".into(), payer_email.to_string()),
            ("amount".into(), format_cents(purchase.price_cents)),
            (
                "item_name".into(),
                format!("{} vitae credits", purchase.credits),
            ),
            (FIELD_PURCHASE_ID.into(), purchase.id.to_string()),
            (FIELD_CREDITS.into(), purchase.credits.to_string()),
        ];

        if let Some(signature) = self.sign(&fields) {
            fields.push((SIGNATURE_FIELD.into(), signature));
        }

        // Building the query from already-signed fields keeps the redirect
        // deterministic for a given purchase.
        let query = serde_urlencoded::to_string(&fields).unwrap_or_default();
        let redirect_url = format!("{}?{}", self.config.process_url, query);

        CheckoutRequest {
            redirect_url,
            fields,
        }
    }

    /// Verify an inbound callback's signature.
    ///
    /// Returns `false` on any mismatch, an absent `signature` field, or a
    /// missing shared passphrase. Never errors.
    #[must_use]
    pub fn verify_callback(&self, fields: &BTreeMap<String, String>) -> bool {
        let Some(provided) = fields.get(SIGNATURE_FIELD) else {
            return false;
        };

        // BTreeMap iteration is already sorted by field name.
        let signable: Vec<(String, String)> = fields
            .iter()
            .filter(|(name, _)| name.as_str() != SIGNATURE_FIELD)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let Some(expected) = self.sign(&signable) else {
            return false;
        };

        constant_time_eq(&expected, provided)
    }

    /// Sign a field set: sorted, form-urlencoded, HMAC-SHA256, hex.
    ///
    /// Returns `None` when no passphrase is configured.
    fn sign(&self, fields: &[(String, String)]) -> Option<String> {
        let passphrase = self.config.passphrase.as_deref()?;

        let mut sorted: Vec<(String, String)> = fields.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let message = serde_urlencoded::to_string(&sorted).ok()?;
        Some(hmac_sha256_hex(passphrase, &message))
    }
}

/// Format a cent amount as a decimal string ("9900" -> "99.00").
fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitae_core::UserId;

    fn test_gateway(passphrase: Option<&str>) -> PaymentGateway {
        PaymentGateway::new(GatewayConfig {
            merchant_id: "10000100".into(),
            merchant_key: "46f0cd694581a".into(),
            passphrase: passphrase.map(String::from),
            process_url: "https://sandbox.gateway.example/eng/process".into(),
            return_url: "https://app.example/billing/return".into(),
            cancel_url: "https://app.example/billing/cancel".into(),
            notify_url: "https://api.example/webhooks/payment".into(),
        })
    }

    fn as_map(fields: &[(String, String)]) -> BTreeMap<String, String> {
        fields.iter().cloned().collect()
    }

    #[test]
    fn checkout_request_is_deterministic() {
        let gateway = test_gateway(Some("secret-passphrase"));
        let purchase = PurchaseRecord::new(UserId::generate(), 50, 9900);

        let first = gateway.build_checkout_request(&purchase, "jo@example.com", "Jo");
        let second = gateway.build_checkout_request(&purchase, "jo@example.com", "Jo");

        assert_eq!(first.redirect_url, second.redirect_url);
        assert_eq!(first.fields, second.fields);
    }

    #[test]
    fn checkout_request_carries_echo_fields() {
        let gateway = test_gateway(Some("secret-passphrase"));
        let purchase = PurchaseRecord::new(UserId::generate(), 50, 9900);

        let checkout = gateway.build_checkout_request(&purchase, "jo@example.com", "Jo");
        let fields = as_map(&checkout.fields);

        assert_eq!(fields[FIELD_PURCHASE_ID], purchase.id.to_string());
        assert_eq!(fields[FIELD_CREDITS], "50");
        assert_eq!(fields["amount"], "99.00");
        assert!(fields.contains_key(SIGNATURE_FIELD));
    }

    #[test]
    fn own_checkout_fields_verify() {
        let gateway = test_gateway(Some("secret-passphrase"));
        let purchase = PurchaseRecord::new(UserId::generate(), 50, 9900);

        let checkout = gateway.build_checkout_request(&purchase, "jo@example.com", "Jo");
        assert!(gateway.verify_callback(&as_map(&checkout.fields)));
    }

    #[test]
    fn tampered_field_is_rejected() {
        let gateway = test_gateway(Some("secret-passphrase"));
        let purchase = PurchaseRecord::new(UserId::generate(), 50, 9900);

        let checkout = gateway.build_checkout_request(&purchase, "jo@example.com", "Jo");

        let mut tampered = as_map(&checkout.fields);
        tampered.insert("amount".into(), "0.01".into());
        assert!(!gateway.verify_callback(&tampered));

        let mut inflated = as_map(&checkout.fields);
        inflated.insert(FIELD_CREDITS.into(), "5000".into());
        assert!(!gateway.verify_callback(&inflated));
    }

    #[test]
    fn added_field_is_rejected() {
        let gateway = test_gateway(Some("secret-passphrase"));
        let purchase = PurchaseRecord::new(UserId::generate(), 50, 9900);

        let checkout = gateway.build_checkout_request(&purchase, "jo@example.com", "Jo");
        let mut fields = as_map(&checkout.fields);
        fields.insert("payment_status".into(), "COMPLETE".into());

        assert!(!gateway.verify_callback(&fields));
    }

    #[test]
    fn missing_signature_is_rejected() {
        let gateway = test_gateway(Some("secret-passphrase"));
        let mut fields = BTreeMap::new();
        fields.insert("payment_status".into(), "COMPLETE".into());

        assert!(!gateway.verify_callback(&fields));
    }

    #[test]
    fn missing_passphrase_rejects_everything() {
        let signer = test_gateway(Some("secret-passphrase"));
        let verifier = test_gateway(None);
        let purchase = PurchaseRecord::new(UserId::generate(), 50, 9900);

        let checkout = signer.build_checkout_request(&purchase, "jo@example.com", "Jo");
        assert!(!verifier.verify_callback(&as_map(&checkout.fields)));
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let signer = test_gateway(Some("secret-passphrase"));
        let verifier = test_gateway(Some("another-passphrase"));
        let purchase = PurchaseRecord::new(UserId::generate(), 50, 9900);

        let checkout = signer.build_checkout_request(&purchase, "jo@example.com", "Jo");
        assert!(!verifier.verify_callback(&as_map(&checkout.fields)));
    }

    #[test]
    fn no_passphrase_omits_signature_field() {
        let gateway = test_gateway(None);
        let purchase = PurchaseRecord::new(UserId::generate(), 50, 9900);

        let checkout = gateway.build_checkout_request(&purchase, "jo@example.com", "Jo");
        assert!(!as_map(&checkout.fields).contains_key(SIGNATURE_FIELD));
    }

    #[test]
    fn format_cents_pads_fraction() {
        assert_eq!(format_cents(9900), "99.00");
        assert_eq!(format_cents(105), "1.05");
        assert_eq!(format_cents(7), "0.07");
    }
}
