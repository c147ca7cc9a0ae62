use crate::handlers::common::{created_response, map_service_error, validate_input};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for payment recovery endpoints
pub fn recovery_routes() -> Router<Arc<AppState>> {
    Router::new().route("/verify", post(verify_payment))
}

/// Promote a pending UPI payment into a confirmed order.
///
/// Takes the free-text session id from the recovery page. A missing or
/// expired session resolves to 404 with a support-facing message quoting
/// the session id.
#[utoipa::path(
    post,
    path = "/api/v1/recovery/verify",
    request_body = RecoverPaymentRequest,
    responses(
        (status = 201, description = "Order created from pending payment", body = crate::services::orders::OrderDetailResponse),
        (status = 404, description = "Session unknown, expired, or already verified", body = crate::errors::ErrorResponse)
    ),
    tag = "Recovery"
)]
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecoverPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .recovery
        .verify_payment_and_create_order(payload.session_id.trim())
        .await
        .map_err(map_service_error)?;

    Ok(created_response(order))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecoverPaymentRequest {
    #[validate(length(min = 1, message = "Session id is required"))]
    pub session_id: String,
}
