//! Integration tests for the hosted platform backend.
//!
//! Uses wiremock to stand in for the platform's REST surface.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use govmobile::store::{
    Credentials, DataStore, DeviceFilter, OrderFilter, OrderSort, PlatformStore, Session,
    StoreError,
};
use govmobile_core::catalog::DeviceSort;
use govmobile_core::{
    NewOrder, OrderStatus, OrderType, RoleLevel, ShippingAddress, UserPatch,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APP: &str = "gov-mobile";

fn store(server: &MockServer) -> PlatformStore {
    PlatformStore::new(server.uri(), APP).unwrap()
}

fn session() -> Session {
    Session::new("tok-123")
}

fn device_json(id: &str, price: u64, roles: &[&str]) -> serde_json::Value {
    json!({
        "id": id,
        "brand": "Samsung",
        "model": format!("Model {id}"),
        "price": price,
        "availability": "available",
        "category": "smartphone",
        "role_eligibility": roles,
    })
}

// =============================================================================
// AUTH
// =============================================================================

#[tokio::test]
async fn test_login_returns_platform_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/apps/{APP}/auth/login")))
        .and(body_json(json!({ "email": "dana@gov.il", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = store(&server)
        .login(&Credentials::password(" dana@gov.il ", "pw"))
        .await
        .unwrap();
    assert_eq!(session.token(), "tok-123");
}

#[tokio::test]
async fn test_login_accepts_access_token_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/apps/{APP}/auth/login")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok-456" })),
        )
        .mount(&server)
        .await;

    let session = store(&server)
        .login(&Credentials::password("dana@gov.il", "pw"))
        .await
        .unwrap();
    assert_eq!(session.token(), "tok-456");
}

#[tokio::test]
async fn test_trusted_login_is_unsupported() {
    let server = MockServer::start().await;

    let result = store(&server)
        .login(&Credentials::trusted("noa@gov.il", "Noa"))
        .await;
    assert!(matches!(result, Err(StoreError::Unsupported { .. })));
}

#[tokio::test]
async fn test_expired_session_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/apps/{APP}/entities/User/me")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = store(&server).current_user(&session()).await;
    assert!(matches!(result, Err(StoreError::Unauthenticated)));
}

// =============================================================================
// USERS
// =============================================================================

#[tokio::test]
async fn test_current_user_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/apps/{APP}/entities/User/me")))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "email": "dana@gov.il",
            "full_name": "Dana Levi",
            "role_level": "premium",
            "budget_allowance": 3000,
            "remaining_budget": 2500
        })))
        .mount(&server)
        .await;

    let user = store(&server).current_user(&session()).await.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.role_level, Some(RoleLevel::Premium));
}

#[tokio::test]
async fn test_update_sends_only_patched_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/apps/{APP}/entities/User/me")))
        .and(body_json(json!({ "job_title": "Analyst" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "job_title": "Analyst"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let patch = UserPatch {
        job_title: Some("Analyst".to_string()),
        ..UserPatch::default()
    };
    let user = store(&server)
        .update_current_user(&session(), &patch)
        .await
        .unwrap();
    assert_eq!(user.job_title.as_deref(), Some("Analyst"));
}

// =============================================================================
// DEVICES
// =============================================================================

#[tokio::test]
async fn test_filter_by_id_is_sent_as_q() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/apps/{APP}/entities/Device")))
        .and(query_param("q", r#"{"id":"d1"}"#))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([device_json("d1", 900, &["basic"])])),
        )
        .mount(&server)
        .await;

    let devices = store(&server)
        .filter_devices(&session(), &DeviceFilter::by_id("d1"), None, Some(1))
        .await
        .unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, "d1");
}

#[tokio::test]
async fn test_role_filter_is_applied_locally_before_the_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/apps/{APP}/entities/Device")))
        .and(query_param("sort", "-price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            device_json("exec", 7000, &["executive"]),
            device_json("d2", 3000, &["standard", "premium"]),
            device_json("d3", 2000, &["standard"]),
            device_json("d4", 900, &["basic", "standard"]),
        ])))
        .mount(&server)
        .await;

    let devices = store(&server)
        .filter_devices(
            &session(),
            &DeviceFilter::eligible_for(RoleLevel::Standard),
            Some(DeviceSort::PriceDesc),
            Some(2),
        )
        .await
        .unwrap();
    let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["d2", "d3"]);
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/apps/{APP}/entities/Device")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = store(&server).list_devices(&session()).await;
    match result {
        Err(StoreError::Remote { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/apps/{APP}/entities/Device")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = store(&server).list_devices(&session()).await;
    assert!(matches!(result, Err(StoreError::Decode(_))));
}

// =============================================================================
// ORDERS
// =============================================================================

#[tokio::test]
async fn test_orders_for_user_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/apps/{APP}/entities/Order")))
        .and(query_param("q", r#"{"user_id":"u1"}"#))
        .and(query_param("sort", "-created_date"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let orders = store(&server)
        .filter_orders(
            &session(),
            &OrderFilter::for_user("u1"),
            Some(OrderSort::Newest),
            Some(3),
        )
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_create_order_posts_and_returns_stored_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/apps/{APP}/entities/Order")))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "o-77",
            "order_number": "ORD-1709283600000",
            "user_id": "u1",
            "device_id": "d1",
            "order_type": "upgrade",
            "status": "pending",
            "total_cost": 3000,
            "upgrade_fee": 500,
            "justification": "Old handset",
            "created_date": "2024-03-01T09:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let new = NewOrder {
        order_number: "ORD-1709283600000".to_string(),
        user_id: "u1".to_string(),
        device_id: "d1".to_string(),
        order_type: OrderType::Upgrade,
        status: OrderStatus::Pending,
        total_cost: 3000,
        upgrade_fee: 500,
        justification: "Old handset".to_string(),
        shipping_address: ShippingAddress::new("Herzl 1", "", "Haifa", "31000"),
        estimated_delivery: None,
        tracking_number: None,
    };
    let order = store(&server).create_order(&session(), &new).await.unwrap();
    assert_eq!(order.id, "o-77");
    assert_eq!(order.status, OrderStatus::Pending);
}
