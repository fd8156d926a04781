//! Credit balance, history, catalog, and checkout integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn fresh_user_balance_is_zero() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 0);
}

#[tokio::test]
async fn get_balance_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/credits/balance").await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn completed_purchase_shows_in_balance() {
    let harness = TestHarness::new();

    harness.fund_with_package("starter", 50).await;

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 50);
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn list_transactions_empty() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["transactions"].as_array().unwrap().is_empty());
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn purchase_appears_in_transactions() {
    let harness = TestHarness::new();

    harness.fund_with_package("starter", 50).await;

    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["amount"], 50);
    assert_eq!(transactions[0]["balance_after"], 50);
    assert_eq!(transactions[0]["transaction_type"], "purchase");
}

#[tokio::test]
async fn transactions_are_isolated_per_user() {
    let harness = TestHarness::new();

    harness.fund_with_package("starter", 50).await;

    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", TestHarness::other_user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_transactions_with_pagination() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/transactions?limit=10&offset=0")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn list_packages_returns_catalog() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/packages")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let packages = body.as_array().unwrap();
    assert_eq!(packages.len(), 3);

    let starter = &packages[0];
    assert_eq!(starter["id"], "starter");
    assert_eq!(starter["credits"], 50);
    assert_eq!(starter["price_cents"], 9900);
}

#[tokio::test]
async fn list_costs_returns_feature_table() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/costs")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let costs = body.as_array().unwrap();

    let cv = costs
        .iter()
        .find(|c| c["feature"] == "cv_generation")
        .unwrap();
    assert_eq!(cv["cost"], 10);

    let interview = costs
        .iter()
        .find(|c| c["feature"] == "interview_session")
        .unwrap();
    assert_eq!(interview["cost"], 30);
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn checkout_returns_signed_redirect() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "package_id": "standard" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["purchase_id"].as_str().is_some());

    let redirect = body["redirect_url"].as_str().unwrap();
    assert!(redirect.starts_with("https://sandbox.gateway.example/eng/process?"));
    assert!(redirect.contains("signature="));

    let fields = body["fields"].as_array().unwrap();
    assert!(fields
        .iter()
        .any(|f| f[0] == "custom_str2" && f[1] == "120"));
}

#[tokio::test]
async fn checkout_does_not_credit_balance() {
    let harness = TestHarness::new();

    harness.checkout("pro").await;

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 0);
}

#[tokio::test]
async fn checkout_unknown_package_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "package_id": "mega-deluxe" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn checkout_without_gateway_fails() {
    let harness = TestHarness::without_gateway();

    let response = harness
        .server
        .post("/v1/credits/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "package_id": "starter" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn checkout_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/checkout")
        .json(&json!({ "package_id": "starter" }))
        .await;

    response.assert_status_unauthorized();
}
