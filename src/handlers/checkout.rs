use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    checkout::{CartLine, OrderDraft, ShippingDetails},
    entities::order::PaymentMethod,
    errors::ApiError,
    services::checkout::{RotateSession, StartCheckout, StartedCheckout, SubmitOrder},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(start_checkout))
        .route("/sessions/:session_id/rotate", post(rotate_session))
        .route("/resume", get(resume_checkout).delete(decline_resume))
        .route("/orders", post(submit_order))
}

/// Start a UPI checkout session
#[utoipa::path(
    post,
    path = "/api/v1/checkout/sessions",
    request_body = StartCheckoutRequest,
    responses(
        (status = 201, description = "Checkout session issued", body = CheckoutSessionResponse),
        (status = 400, description = "Invalid shipping form or cart", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn start_checkout(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StartCheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let session = state
        .services
        .checkout
        .start_checkout(StartCheckout {
            user_id: payload.user_id,
            device_id: payload.device_id,
            draft: OrderDraft {
                shipping: payload.shipping,
                items: payload.items,
            },
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(CheckoutSessionResponse::from(session)))
}

/// Rotate a lapsed checkout session
#[utoipa::path(
    post,
    path = "/api/v1/checkout/sessions/{session_id}/rotate",
    params(("session_id" = String, Path, description = "Session id being rotated away")),
    request_body = RotateSessionRequest,
    responses(
        (status = 201, description = "Replacement session issued", body = CheckoutSessionResponse),
        (status = 400, description = "Invalid shipping form or cart", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn rotate_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<RotateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let session = state
        .services
        .checkout
        .rotate_session(RotateSession {
            user_id: payload.user_id,
            device_id: payload.device_id,
            previous_session_id: session_id,
            draft: OrderDraft {
                shipping: payload.shipping,
                items: payload.items,
            },
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(CheckoutSessionResponse::from(session)))
}

/// Fetch a resumable checkout for this device
#[utoipa::path(
    get,
    path = "/api/v1/checkout/resume",
    params(ResumeQuery),
    responses(
        (status = 200, description = "Resumable checkout found", body = crate::checkout::mirror::CheckoutMirror),
        (status = 204, description = "Nothing to resume")
    ),
    tag = "Checkout"
)]
pub async fn resume_checkout(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResumeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    match state.services.checkout.resume(&query.device_id) {
        Some(mirror) => Ok(success_response(mirror)),
        None => Ok(no_content_response()),
    }
}

/// Decline to resume; drop the mirrored checkout
#[utoipa::path(
    delete,
    path = "/api/v1/checkout/resume",
    params(ResumeQuery),
    responses((status = 204, description = "Mirror dropped")),
    tag = "Checkout"
)]
pub async fn decline_resume(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResumeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.checkout.decline_resume(&query.device_id);
    Ok(no_content_response())
}

/// Submit the order (COD, or UPI after the buyer claims payment)
#[utoipa::path(
    post,
    path = "/api/v1/checkout/orders",
    request_body = SubmitOrderRequest,
    responses(
        (status = 201, description = "Order created", body = crate::services::orders::OrderDetailResponse),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn submit_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .checkout
        .submit_order(SubmitOrder {
            user_id: payload.user_id,
            device_id: payload.device_id,
            payment_method: payload.payment_method,
            payment_session_id: payload.payment_session_id,
            total_amount: payload.total_amount,
            draft: OrderDraft {
                shipping: payload.shipping,
                items: payload.items,
            },
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(order))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartCheckoutRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub device_id: String,
    #[validate]
    pub shipping: ShippingDetails,
    #[validate]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RotateSessionRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub device_id: String,
    #[validate]
    pub shipping: ShippingDetails,
    #[validate]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ResumeQuery {
    /// Opaque device identifier the checkout mirror is keyed by
    pub device_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitOrderRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub device_id: String,
    pub payment_method: PaymentMethod,
    /// Required when `payment_method` is `upi`
    pub payment_session_id: Option<String>,
    pub total_amount: Decimal,
    #[validate]
    pub shipping: ShippingDetails,
    #[validate]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub amount: Decimal,
    pub upi_uri: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub window_secs: u32,
}

impl From<StartedCheckout> for CheckoutSessionResponse {
    fn from(session: StartedCheckout) -> Self {
        Self {
            session_id: session.session_id,
            amount: session.amount,
            upi_uri: session.upi_uri,
            created_at: session.created_at,
            expires_at: session.expires_at,
            window_secs: session.window_secs,
        }
    }
}
