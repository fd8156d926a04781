//! Common test utilities for vitae-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tempfile::TempDir;

use vitae_core::UserId;
use vitae_service::{create_router, AppState, GatewayConfig, ServiceConfig};
use vitae_store::RocksStore;

/// Passphrase shared between the harness and the configured gateway.
pub const TEST_PASSPHRASE: &str = "test-passphrase";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and a configured
    /// gateway.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Create a harness without any gateway configuration.
    pub fn without_gateway() -> Self {
        Self::build(false)
    }

    fn build(with_gateway: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let service_api_key = "test-service-key".to_string();

        let gateway = with_gateway.then(|| GatewayConfig {
            merchant_id: "10000100".into(),
            merchant_key: "46f0cd694581a".into(),
            passphrase: Some(TEST_PASSPHRASE.into()),
            process_url: "https://sandbox.gateway.example/eng/process".into(),
            return_url: "http://localhost:3000/billing/return".into(),
            cancel_url: "http://localhost:3000/billing/cancel".into(),
            notify_url: "http://localhost:8080/webhooks/payment".into(),
        });

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_base_url: "http://localhost".into(),
            auth_audience: "vitae-billing".into(),
            service_api_key: Some(service_api_key.clone()),
            gateway,
            frontend_url: "http://localhost:3000".into(),
            public_url: "http://localhost:8080".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
            service_api_key,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        let other_user = UserId::generate();
        format!("Bearer test-token:{other_user}")
    }

    /// Initiate a checkout for the given package and return the new
    /// purchase ID.
    pub async fn checkout(&self, package_id: &str) -> String {
        let response = self
            .server
            .post("/v1/credits/checkout")
            .add_header("authorization", self.user_auth_header())
            .json(&serde_json::json!({ "package_id": package_id }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["purchase_id"]
            .as_str()
            .expect("checkout response carries purchase_id")
            .to_string()
    }

    /// Build a signed gateway callback payload for a purchase.
    ///
    /// Mirrors the gateway's signing scheme independently: all fields except
    /// `signature`, sorted by name, form-urlencoded, HMAC-SHA256 with the
    /// shared passphrase, hex-encoded.
    pub fn signed_callback(
        purchase_id: &str,
        credits: i64,
        payment_status: &str,
    ) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert("payment_status".to_string(), payment_status.to_string());
        fields.insert("pf_payment_id".to_string(), "PF-123456".to_string());
        fields.insert("custom_str1".to_string(), purchase_id.to_string());
        fields.insert("custom_str2".to_string(), credits.to_string());

        let signature = sign_fields(&fields, TEST_PASSPHRASE);
        fields.insert("signature".to_string(), signature);
        fields
    }

    /// Credit a user by walking a full purchase through checkout and a
    /// completed gateway callback.
    pub async fn fund_with_package(&self, package_id: &str, credits: i64) {
        let purchase_id = self.checkout(package_id).await;
        let fields = Self::signed_callback(&purchase_id, credits, "COMPLETE");

        self.server
            .post("/webhooks/payment")
            .form(&fields)
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign a sorted field set the way the gateway does.
pub fn sign_fields(fields: &BTreeMap<String, String>, passphrase: &str) -> String {
    let signable: Vec<(&String, &String)> = fields
        .iter()
        .filter(|(name, _)| name.as_str() != "signature")
        .collect();

    let message = serde_urlencoded::to_string(&signable).expect("fields serialize");

    let mut mac = Hmac::<Sha256>::new_from_slice(passphrase.as_bytes())
        .expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
