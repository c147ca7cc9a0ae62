use crate::{
    checkout::OrderDraft,
    db::DbPool,
    entities::order::{OrderStatus, PaymentMethod, PaymentStatus},
    entities::pending_payment::Model as PendingPaymentModel,
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifications::{spawn_order_email, EmailRelay},
    services::orders::{OrderDetailResponse, OrderService},
    services::pending_payments::PendingPaymentService,
};
use async_trait::async_trait;
use sea_orm::TransactionTrait;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Seam for deciding whether a claimed UPI payment actually happened.
///
/// The shipped implementation trusts the caller; swapping in a gateway
/// webhook or a bank-statement poller changes nothing for callers of the
/// recovery service.
#[async_trait]
pub trait PaymentVerificationStrategy: Send + Sync {
    async fn verify(&self, record: &PendingPaymentModel) -> Result<(), ServiceError>;

    fn name(&self) -> &'static str;
}

/// Accepts the buyer's assertion that the payment went through. Resolution
/// of a false claim is manual, using the session id as the correlation
/// token against the bank statement.
pub struct ManualAssertion;

#[async_trait]
impl PaymentVerificationStrategy for ManualAssertion {
    async fn verify(&self, record: &PendingPaymentModel) -> Result<(), ServiceError> {
        info!(session_id = %record.session_id, amount = %record.amount, "accepting buyer-asserted payment");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "manual_assertion"
    }
}

/// Promotes a pending payment record into a confirmed, paid order.
#[derive(Clone)]
pub struct RecoveryService {
    db: Arc<DbPool>,
    pending_payments: PendingPaymentService,
    strategy: Arc<dyn PaymentVerificationStrategy>,
    event_sender: Option<Arc<EventSender>>,
    email_relay: Option<Arc<dyn EmailRelay>>,
}

impl RecoveryService {
    pub fn new(
        db: Arc<DbPool>,
        pending_payments: PendingPaymentService,
        strategy: Arc<dyn PaymentVerificationStrategy>,
        event_sender: Option<Arc<EventSender>>,
        email_relay: Option<Arc<dyn EmailRelay>>,
    ) -> Self {
        Self {
            db,
            pending_payments,
            strategy,
            event_sender,
            email_relay,
        }
    }

    /// Resolves a checkout attempt from its session id: verifies the
    /// payment, claims the pending record, and creates the confirmed order
    /// with its lines, all but the verification inside one transaction.
    ///
    /// The claim is filtered to still-pending, unexpired rows, so a second
    /// invocation on the same session fails with NotFound instead of
    /// creating a duplicate order.
    #[instrument(skip(self), fields(session_id = %session_id, strategy = self.strategy.name()))]
    pub async fn verify_payment_and_create_order(
        &self,
        session_id: &str,
    ) -> Result<OrderDetailResponse, ServiceError> {
        let record = self
            .pending_payments
            .get_pending_payment(session_id)
            .await?
            .ok_or_else(|| {
                warn!(session_id, "recovery lookup found no claimable pending payment");
                ServiceError::NotFound(format!(
                    "No pending payment found for session {}. Please contact support and quote this session id.",
                    session_id
                ))
            })?;

        self.strategy.verify(&record).await?;

        let draft: OrderDraft = serde_json::from_value(record.order_data.clone())?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, session_id, "Failed to start transaction for payment recovery");
            ServiceError::DatabaseError(e)
        })?;

        let claimed = self.pending_payments.claim_pending(&txn, session_id).await?;

        let (order_model, item_models) = OrderService::insert_order_with_items(
            &txn,
            claimed.user_id,
            claimed.amount,
            OrderStatus::Confirmed,
            PaymentStatus::Paid,
            PaymentMethod::Upi,
            Some(claimed.session_id.clone()),
            &draft,
        )
        .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, session_id, "Failed to commit payment recovery transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(session_id, order_id = %order_model.id, "pending payment promoted to confirmed order");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PendingPaymentVerified {
                    session_id: claimed.session_id.clone(),
                    order_id: order_model.id,
                })
                .await
            {
                warn!(error = %e, "Failed to send payment verified event");
            }
            if let Err(e) = event_sender.send(Event::OrderCreated(order_model.id)).await {
                warn!(error = %e, "Failed to send order created event");
            }
        }

        spawn_order_email(
            self.email_relay.clone(),
            OrderService::order_summary(&order_model, &item_models, &draft),
        );

        Ok(OrderService::detail_response(order_model, item_models))
    }
}
