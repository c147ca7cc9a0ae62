//! End-to-end tests for pending payment recovery: promotion into a
//! confirmed order, idempotency of the claim, and lazy expiry.

mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use storefront_api::entities::pending_payment::{self, PendingPaymentStatus};
use uuid::Uuid;

fn shipping_json() -> Value {
    json!({
        "name": "Asha Rao",
        "email": "asha@example.com",
        "phone": "9876543210",
        "address": "14 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postal_code": "560001"
    })
}

fn cart_items_json() -> Value {
    json!([{
        "product_id": Uuid::new_v4().to_string(),
        "product_name": "Block-print kurta",
        "quantity": 2,
        "unit_price": "425",
        "size": "M",
        "color": "indigo"
    }])
}

async fn issue_session(app: &TestApp, user_id: Uuid, device_id: &str) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout/sessions",
            Some(json!({
                "user_id": user_id.to_string(),
                "device_id": device_id,
                "shipping": shipping_json(),
                "items": cart_items_json()
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["session_id"]
        .as_str()
        .expect("session id")
        .to_string()
}

#[tokio::test]
async fn unknown_session_fails_with_not_found_and_writes_nothing() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/recovery/verify",
            Some(json!({ "session_id": "1700000000000doesnotexist" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    // Support path quotes the session id as the correlation token
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("1700000000000doesnotexist"));
}

#[tokio::test]
async fn valid_pending_record_is_promoted_exactly_once() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();
    let session_id = issue_session(&app, user_id, "device-recovery").await;

    // First recovery: confirmed, paid order out of the pending record
    let response = app
        .request(
            Method::POST,
            "/api/v1/recovery/verify",
            Some(json!({ "session_id": session_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;

    assert_eq!(body["order"]["status"], "confirmed");
    assert_eq!(body["order"]["payment_status"], "paid");
    assert_eq!(body["order"]["payment_session_id"], session_id.as_str());
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    // The source record is consumed: no longer claimable
    assert!(app
        .state
        .services
        .pending_payments
        .get_pending_payment(&session_id)
        .await
        .expect("pending lookup")
        .is_none());

    // Second invocation must not mint a second order
    let second = app
        .request(
            Method::POST,
            "/api/v1/recovery/verify",
            Some(json!({ "session_id": session_id })),
        )
        .await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);

    let listed = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/orders?user_id={}", user_id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn expired_pending_record_reads_as_absent() {
    let app = TestApp::new().await;
    let session_id = "1700000000000expiredsession";
    let created_at = Utc::now() - Duration::hours(25);

    // Row still says pending, but its deadline has passed
    let record = pending_payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        session_id: Set(session_id.to_string()),
        user_id: Set(Uuid::new_v4()),
        amount: Set(dec!(851)),
        order_data: Set(json!({
            "shipping": shipping_json(),
            "items": cart_items_json()
        })),
        status: Set(PendingPaymentStatus::Pending),
        created_at: Set(created_at),
        expires_at: Set(created_at + Duration::hours(24)),
    };
    record
        .insert(&*app.state.db)
        .await
        .expect("seed expired pending payment");

    assert!(app
        .state
        .services
        .pending_payments
        .get_pending_payment(session_id)
        .await
        .expect("pending lookup")
        .is_none());

    let response = app
        .request(
            Method::POST,
            "/api/v1/recovery/verify",
            Some(json!({ "session_id": session_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_session_id_is_rejected_by_the_store() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();
    let session_id = issue_session(&app, user_id, "device-dup").await;

    // A second record for the same session id violates the idempotency key
    let result = app
        .state
        .services
        .pending_payments
        .create_pending_payment(storefront_api::services::pending_payments::NewPendingPayment {
            session_id: session_id.clone(),
            user_id,
            amount: dec!(851),
            draft: serde_json::from_value(json!({
                "shipping": shipping_json(),
                "items": cart_items_json()
            }))
            .expect("draft json"),
        })
        .await;

    assert_matches!(
        result,
        Err(storefront_api::errors::ServiceError::Conflict(_))
    );
}
