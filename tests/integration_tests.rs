//! Integration tests for the EcoBin Points Server API
//!
//! These tests verify the complete request/response cycle for all endpoints.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use ecobin_server::security::{sign, signed_identity};
use ecobin_server::{open_database, router, AppState, Config, Db};

// Test configuration constants
const TEST_SECRET: &str = "test-secret-key";
const TEST_SERVICE_KEY: &str = "test-service-key";

// =============================================================================
// Test Helpers
// =============================================================================

/// Create a test configuration
fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_path: "".to_string(), // Set per test
        allowed_origins: vec!["http://localhost:5173".to_string()],
        environment: "test".to_string(),
        app_secret_key: TEST_SECRET.to_string(),
        service_secret_key: Some(TEST_SERVICE_KEY.to_string()),
        log_requests: false,
        default_transaction_limit: 50,
    }
}

/// Create a test database in a temporary directory
async fn create_test_db(temp_dir: &TempDir) -> Db {
    open_database(temp_dir.path().join("test.db"))
        .await
        .expect("Failed to create test database")
}

/// Create a test app router
fn create_test_app(db: Db) -> Router {
    router(AppState::new(db, test_config()))
}

/// Create a test app router with trusted endpoints disabled
fn create_test_app_without_service_key(db: Db) -> Router {
    let mut config = test_config();
    config.service_secret_key = None;
    router(AppState::new(db, config))
}

/// Parse response body as JSON
async fn body_to_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Attach signed identity headers for `user_id`
fn signed(builder: axum::http::request::Builder, user_id: &str) -> axum::http::request::Builder {
    let timestamp = chrono::Utc::now().timestamp();
    let signature = sign(&signed_identity(user_id, timestamp), TEST_SECRET).unwrap();
    builder
        .header("x-user-id", user_id)
        .header("x-timestamp", timestamp.to_string())
        .header("x-signature", signature)
}

/// Create a POST request with JSON body
fn make_post_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Create a GET request
fn make_get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Create a signed GET request on behalf of `user_id`
fn make_user_get(uri: &str, user_id: &str) -> Request<Body> {
    signed(Request::builder().uri(uri), user_id)
        .body(Body::empty())
        .unwrap()
}

/// Create a signed POST request on behalf of `user_id`
fn make_user_post(uri: &str, user_id: &str, body: String) -> Request<Body> {
    signed(Request::builder().method("POST").uri(uri), user_id)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Create a POST request from a trusted service, optionally on behalf of a user
fn make_service_post(uri: &str, user_id: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-service-key", TEST_SERVICE_KEY);
    if let Some(user_id) = user_id {
        builder = signed(builder, user_id);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn register(db: &Db, user_id: &str) {
    let body = json!({ "userId": user_id, "username": format!("{}-name", user_id) });
    let response = create_test_app(db.clone())
        .oneshot(make_post_request("/api/register", body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn award(db: &Db, user_id: &str, amount: i64) -> Value {
    let body = json!({
        "amount": amount,
        "source": "recycling",
        "description": "Recycled 5kg plastic"
    });
    let response = create_test_app(db.clone())
        .oneshot(make_service_post(
            "/api/eco-points/award",
            Some(user_id),
            body.to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_to_json(response.into_body()).await
}

async fn create_reward(db: &Db, cost: i64) -> i64 {
    let body = json!({
        "title": "Bulk store voucher",
        "type": "voucher",
        "value": 5.0,
        "ecoPointsCost": cost,
        "category": "food"
    });
    let response = create_test_app(db.clone())
        .oneshot(make_service_post("/api/admin/rewards", None, body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_to_json(response.into_body()).await["id"]
        .as_i64()
        .unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check_returns_healthy() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let app = create_test_app(db);

    let response = app.oneshot(make_get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["version"].as_str().is_some());
}

// =============================================================================
// Registration Tests
// =============================================================================

#[tokio::test]
async fn test_register_user_success() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let app = create_test_app(db);

    let body = json!({ "userId": "user-1", "username": "eco-warrior" });

    let response = app
        .oneshot(make_post_request("/api/register", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["ecoPoints"], 0);
    assert_eq!(body["user"]["greenTier"], "Bronze");
}

#[tokio::test]
async fn test_register_duplicate_user_returns_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let body = json!({ "userId": "user-1", "username": "someone-else" });
    let response = create_test_app(db)
        .oneshot(make_post_request("/api/register", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "conflict");
    assert!(body["message"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_register_invalid_user_id_format() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let app = create_test_app(db);

    let body = json!({ "userId": "bad id!", "username": "eco-warrior" });

    let response = app
        .oneshot(make_post_request("/api/register", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "validation_error");
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[tokio::test]
async fn test_transactions_require_signature() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let response = create_test_app(db)
        .oneshot(make_get_request("/api/eco-points/transactions"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forged_signature_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let timestamp = chrono::Utc::now().timestamp();
    let signature = sign(&signed_identity("user-1", timestamp), "wrong-secret").unwrap();
    let request = Request::builder()
        .uri("/api/eco-points/transactions")
        .header("x-user-id", "user-1")
        .header("x-timestamp", timestamp.to_string())
        .header("x-signature", signature)
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(db).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// EcoPoints Tests
// =============================================================================

#[tokio::test]
async fn test_award_returns_transaction_and_user() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let body = award(&db, "user-1", 50).await;

    assert_eq!(body["transaction"]["amount"], 50);
    assert_eq!(body["transaction"]["source"], "recycling");
    assert!(body["transaction"]["referenceId"].is_null());
    assert!(body["transaction"]["createdAt"].as_str().is_some());
    assert_eq!(body["user"]["ecoPoints"], 50);
}

#[tokio::test]
async fn test_award_requires_service_key() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let body = json!({ "amount": 1000, "source": "quiz", "description": "Free points" });
    let response = create_test_app(db.clone())
        .oneshot(make_user_post(
            "/api/eco-points/award",
            "user-1",
            body.to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        ecobin_server::db::ledger::get_balance(&db, "user-1")
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_award_disabled_without_configured_service_key() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let body = json!({ "amount": 10, "source": "quiz", "description": "Quiz" });
    let response = create_test_app_without_service_key(db)
        .oneshot(make_service_post(
            "/api/eco-points/award",
            Some("user-1"),
            body.to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_award_rejects_redemption_source() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let body = json!({
        "amount": -10,
        "source": "reward_redemption",
        "description": "Sneaky"
    });
    let response = create_test_app(db)
        .oneshot(make_service_post(
            "/api/eco-points/award",
            Some("user-1"),
            body.to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_award_rejects_oversized_amount() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let body = json!({
        "amount": i64::MAX,
        "source": "quiz",
        "description": "Quiz"
    });
    let response = create_test_app(db)
        .oneshot(make_service_post(
            "/api/eco-points/award",
            Some("user-1"),
            body.to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_award_rejects_zero_amount() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let body = json!({ "amount": 0, "source": "quiz", "description": "Quiz" });
    let response = create_test_app(db)
        .oneshot(make_service_post(
            "/api/eco-points/award",
            Some("user-1"),
            body.to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_award_for_unregistered_user_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;

    let body = json!({ "amount": 10, "source": "quiz", "description": "Quiz" });
    let response = create_test_app(db)
        .oneshot(make_service_post(
            "/api/eco-points/award",
            Some("ghost"),
            body.to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_list_transactions_newest_first_with_limit() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;
    award(&db, "user-1", 10).await;
    award(&db, "user-1", 20).await;
    award(&db, "user-1", 30).await;

    let response = create_test_app(db)
        .oneshot(make_user_get(
            "/api/eco-points/transactions?limit=2",
            "user-1",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    let transactions = body.as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["amount"], 30);
    assert_eq!(transactions[1]["amount"], 20);
    for transaction in transactions {
        assert!(transaction["id"].as_i64().is_some());
        assert!(transaction["description"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_points_summary() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;
    award(&db, "user-1", 520).await;

    let response = create_test_app(db)
        .oneshot(make_user_get("/api/eco-points/summary", "user-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["balance"], 520);
    assert_eq!(body["greenTier"], "Silver");
    assert_eq!(body["lifetimeEarned"], 520);
    assert_eq!(body["nextTierAt"], 1500);
}

// =============================================================================
// Reward Tests
// =============================================================================

#[tokio::test]
async fn test_reward_catalog_lists_active_rewards_by_cost() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let expensive = create_reward(&db, 300).await;
    let cheap = create_reward(&db, 100).await;
    let disabled = create_reward(&db, 50).await;

    let response = create_test_app(db.clone())
        .oneshot(make_service_post(
            &format!("/api/admin/rewards/{}/active", disabled),
            None,
            json!({ "isActive": false }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = create_test_app(db)
        .oneshot(make_get_request("/api/rewards"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![cheap, expensive]);
}

#[tokio::test]
async fn test_redeem_reward_success() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;
    award(&db, "user-1", 100).await;
    let reward_id = create_reward(&db, 60).await;

    let response = create_test_app(db.clone())
        .oneshot(make_user_post(
            &format!("/api/rewards/{}/redeem", reward_id),
            "user-1",
            String::new(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["rewardId"], reward_id);
    assert_eq!(body["isUsed"], false);
    assert!(body["redemptionCode"]
        .as_str()
        .unwrap()
        .starts_with("ECO-"));

    let response = create_test_app(db)
        .oneshot(make_user_get("/api/user/rewards", "user-1"))
        .await
        .unwrap();
    let history = body_to_json(response.into_body()).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["redemptionCode"], body["redemptionCode"]);
}

#[tokio::test]
async fn test_redeem_insufficient_balance_message() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;
    award(&db, "user-1", 10).await;
    let reward_id = create_reward(&db, 60).await;

    let response = create_test_app(db)
        .oneshot(make_user_post(
            &format!("/api/rewards/{}/redeem", reward_id),
            "user-1",
            String::new(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "insufficient_balance");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("60"));
    assert!(message.contains("10"));
}

#[tokio::test]
async fn test_redeem_missing_reward_returns_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;

    let response = create_test_app(db)
        .oneshot(make_user_post(
            "/api/rewards/4242/redeem",
            "user-1",
            String::new(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redeem_out_of_stock_returns_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;
    award(&db, "user-1", 100).await;

    let body = json!({
        "title": "Last tote bag",
        "type": "voucher",
        "value": 3.0,
        "ecoPointsCost": 10,
        "stockQuantity": 0
    });
    let response = create_test_app(db.clone())
        .oneshot(make_service_post("/api/admin/rewards", None, body.to_string()))
        .await
        .unwrap();
    let reward_id = body_to_json(response.into_body()).await["id"]
        .as_i64()
        .unwrap();

    let response = create_test_app(db)
        .oneshot(make_user_post(
            &format!("/api/rewards/{}/redeem", reward_id),
            "user-1",
            String::new(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "out_of_stock");
}

#[tokio::test]
async fn test_use_redeemed_reward_once() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;
    award(&db, "user-1", 100).await;
    let reward_id = create_reward(&db, 60).await;

    let response = create_test_app(db.clone())
        .oneshot(make_user_post(
            &format!("/api/rewards/{}/redeem", reward_id),
            "user-1",
            String::new(),
        ))
        .await
        .unwrap();
    let user_reward_id = body_to_json(response.into_body()).await["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/user/rewards/{}/use", user_reward_id);
    let response = create_test_app(db.clone())
        .oneshot(make_user_post(&uri, "user-1", String::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["isUsed"], true);
    assert!(body["usedAt"].as_str().is_some());

    let response = create_test_app(db)
        .oneshot(make_user_post(&uri, "user-1", String::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "already_used");
}

// =============================================================================
// Admin Tests
// =============================================================================

#[tokio::test]
async fn test_admin_create_reward_validates_cost() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;

    let body = json!({
        "title": "Free reward",
        "type": "donation",
        "value": 1.0,
        "ecoPointsCost": 0
    });
    let response = create_test_app(db)
        .oneshot(make_service_post("/api/admin/rewards", None, body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_audit_reports_consistent_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    register(&db, "user-1").await;
    award(&db, "user-1", 100).await;
    let reward_id = create_reward(&db, 40).await;

    let response = create_test_app(db.clone())
        .oneshot(make_user_post(
            &format!("/api/rewards/{}/redeem", reward_id),
            "user-1",
            String::new(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/api/admin/audit")
        .header("x-service-key", TEST_SERVICE_KEY)
        .body(Body::empty())
        .unwrap();
    let response = create_test_app(db).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["userCount"], 1);
    assert_eq!(body["transactionCount"], 2);
    assert_eq!(body["redemptionCount"], 1);
    assert!(body["drift"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_endpoints_reject_wrong_key() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;

    let request = Request::builder()
        .uri("/api/admin/audit")
        .header("x-service-key", "guess")
        .body(Body::empty())
        .unwrap();
    let response = create_test_app(db).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "unauthorized");
}
