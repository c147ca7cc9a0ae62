use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

/// Creates the router for order readback endpoints
pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:order_id", get(get_order))
}

/// Fetch one order with its lines
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved", body = crate::services::orders::OrderDetailResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(order_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", order_id)))?;

    Ok(success_response(order))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListOrdersQuery {
    /// Buyer whose orders to list
    pub user_id: Uuid,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

/// List a buyer's orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders listed", body = crate::services::orders::OrderListResponse)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_orders(query.user_id, query.page, query.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}
