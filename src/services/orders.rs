use crate::{
    checkout::OrderDraft,
    db::DbPool,
    entities::order::{
        self, Entity as OrderEntity, Model as OrderModel, OrderStatus, PaymentMethod,
        PaymentStatus,
    },
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifications::{spawn_order_email, EmailRelay, OrderSummary, OrderSummaryLine},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Input for creating an order out of a validated draft.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: Uuid,
    pub payment_method: PaymentMethod,
    /// Session correlation token for UPI orders; COD orders carry none.
    pub payment_session_id: Option<String>,
    /// Total as submitted by the client; re-checked against the recomputed
    /// draft total before anything is written.
    pub total_amount: Decimal,
    pub draft: OrderDraft,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub payment_session_id: Option<String>,
    pub shipping_address: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Writes orders and their lines in a single transaction and reads them
/// back for the storefront.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    email_relay: Option<Arc<dyn EmailRelay>>,
}

impl OrderService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        email_relay: Option<Arc<dyn EmailRelay>>,
    ) -> Self {
        Self {
            db,
            event_sender,
            email_relay,
        }
    }

    /// Creates an order in its payment-method-dependent provisional state:
    /// cash on delivery confirms immediately with payment still due; a UPI
    /// claim lands in payment review awaiting verification.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, payment_method = %request.payment_method))]
    pub async fn create_order(
        &self,
        request: CreateOrder,
    ) -> Result<OrderDetailResponse, ServiceError> {
        request
            .draft
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if request.draft.items.is_empty() {
            return Err(ServiceError::ValidationError("Cart is empty".to_string()));
        }

        let expected_total = request.draft.total();
        if request.total_amount != expected_total {
            return Err(ServiceError::ValidationError(format!(
                "Submitted total {} does not match computed total {}",
                request.total_amount, expected_total
            )));
        }

        let (status, payment_status) = match request.payment_method {
            PaymentMethod::Cod => (OrderStatus::Confirmed, PaymentStatus::Pending),
            PaymentMethod::Upi => (OrderStatus::PaymentReview, PaymentStatus::PendingVerification),
        };

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let (order_model, item_models) = Self::insert_order_with_items(
            &txn,
            request.user_id,
            expected_total,
            status,
            payment_status,
            request.payment_method,
            request.payment_session_id,
            &request.draft,
        )
        .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_model.id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_model.id, user_id = %request.user_id, "Order created successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_model.id)).await {
                warn!(error = %e, order_id = %order_model.id, "Failed to send order created event");
            }
        }

        spawn_order_email(
            self.email_relay.clone(),
            Self::order_summary(&order_model, &item_models, &request.draft),
        );

        Ok(Self::detail_response(order_model, item_models))
    }

    /// Inserts the order row and one row per line on the given connection.
    /// Run inside a transaction so an item failure rolls the order back
    /// instead of leaving it orphaned.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn insert_order_with_items<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        total_amount: Decimal,
        status: OrderStatus,
        payment_status: PaymentStatus,
        payment_method: PaymentMethod,
        payment_session_id: Option<String>,
        draft: &OrderDraft,
    ) -> Result<(OrderModel, Vec<OrderItemModel>), ServiceError> {
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let order_active_model = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            total_amount: Set(total_amount),
            status: Set(status),
            payment_status: Set(payment_status),
            payment_method: Set(payment_method),
            payment_session_id: Set(payment_session_id),
            shipping_address: Set(serde_json::to_value(&draft.shipping)?),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let order_model = order_active_model.insert(conn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        let mut item_models = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                product_name: Set(line.product_name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                size: Set(line.size.clone()),
                color: Set(line.color.clone()),
                created_at: Set(now),
            };
            let item_model = item.insert(conn).await.map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to create order item in database");
                ServiceError::DatabaseError(e)
            })?;
            item_models.push(item_model);
        }

        Ok((order_model, item_models))
    }

    /// Retrieves an order with its lines
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<OrderDetailResponse>, ServiceError> {
        let order = OrderEntity::find_by_id(order_id).one(&*self.db).await?;

        let Some(order_model) = order else {
            info!(order_id = %order_id, "Order not found");
            return Ok(None);
        };

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(Some(Self::detail_response(order_model, items)))
    }

    /// Lists a buyer's orders with pagination, newest first
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let paginator = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;

        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page = page, per_page = per_page, "Failed to fetch orders page");
                ServiceError::DatabaseError(e)
            })?;

        let order_responses: Vec<OrderResponse> =
            orders.into_iter().map(Self::model_to_response).collect();

        Ok(OrderListResponse {
            orders: order_responses,
            total,
            page,
            per_page,
        })
    }

    pub(crate) fn model_to_response(model: OrderModel) -> OrderResponse {
        OrderResponse {
            id: model.id,
            user_id: model.user_id,
            total_amount: model.total_amount,
            status: model.status.to_string(),
            payment_status: model.payment_status.to_string(),
            payment_method: model.payment_method.to_string(),
            payment_session_id: model.payment_session_id,
            shipping_address: model.shipping_address,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub(crate) fn detail_response(
        order: OrderModel,
        items: Vec<OrderItemModel>,
    ) -> OrderDetailResponse {
        let items = items
            .into_iter()
            .map(|item| OrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                size: item.size,
                color: item.color,
            })
            .collect();

        OrderDetailResponse {
            order: Self::model_to_response(order),
            items,
        }
    }

    pub(crate) fn order_summary(
        order: &OrderModel,
        items: &[OrderItemModel],
        draft: &OrderDraft,
    ) -> OrderSummary {
        OrderSummary {
            order_id: order.id,
            recipient: draft.shipping.email.clone(),
            customer_name: draft.shipping.name.clone(),
            total_amount: order.total_amount,
            status: order.status.to_string(),
            payment_method: order.payment_method.to_string(),
            items: items
                .iter()
                .map(|item| OrderSummaryLine {
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}
