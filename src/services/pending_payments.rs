use crate::{
    checkout::OrderDraft,
    db::DbPool,
    entities::pending_payment::{
        self, Entity as PendingPaymentEntity, Model as PendingPaymentModel, PendingPaymentStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Pending payment records stay recoverable for this long.
pub const PENDING_PAYMENT_TTL_HOURS: i64 = 24;

/// Input for recording a UPI checkout attempt.
#[derive(Debug, Clone)]
pub struct NewPendingPayment {
    pub session_id: String,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub draft: OrderDraft,
}

/// Durable store for unconfirmed UPI checkout attempts. Reads apply lazy
/// expiry; nothing ever sweeps expired rows.
#[derive(Clone)]
pub struct PendingPaymentService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl PendingPaymentService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Persists a pending record for a freshly minted session. The session
    /// id doubles as an idempotency key: re-recording the same session is a
    /// conflict, not a second row.
    #[instrument(skip(self, input), fields(session_id = %input.session_id, user_id = %input.user_id))]
    pub async fn create_pending_payment(
        &self,
        input: NewPendingPayment,
    ) -> Result<PendingPaymentModel, ServiceError> {
        let now = Utc::now();
        let order_data = serde_json::to_value(&input.draft)?;

        let model = pending_payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(input.session_id.clone()),
            user_id: Set(input.user_id),
            amount: Set(input.amount),
            order_data: Set(order_data),
            status: Set(PendingPaymentStatus::Pending),
            created_at: Set(now),
            expires_at: Set(now + Duration::hours(PENDING_PAYMENT_TTL_HOURS)),
        };

        let record = model.insert(&*self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                warn!(session_id = %input.session_id, "pending payment already recorded for session");
                ServiceError::Conflict(format!(
                    "Pending payment for session {} already exists",
                    input.session_id
                ))
            } else {
                error!(error = %e, session_id = %input.session_id, "failed to persist pending payment");
                ServiceError::DatabaseError(e)
            }
        })?;

        info!(session_id = %record.session_id, "pending payment recorded");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PendingPaymentCreated {
                    session_id: record.session_id.clone(),
                })
                .await
            {
                warn!(error = %e, "failed to send pending payment event");
            }
        }

        Ok(record)
    }

    /// Looks up a recoverable record: `pending` and unexpired. Expired rows
    /// read as absent without being rewritten.
    #[instrument(skip(self))]
    pub async fn get_pending_payment(
        &self,
        session_id: &str,
    ) -> Result<Option<PendingPaymentModel>, ServiceError> {
        let now = Utc::now();

        let record = PendingPaymentEntity::find()
            .filter(pending_payment::Column::SessionId.eq(session_id))
            .filter(pending_payment::Column::Status.eq(PendingPaymentStatus::Pending))
            .filter(pending_payment::Column::ExpiresAt.gt(now))
            .one(&*self.db)
            .await?;

        Ok(record)
    }

    /// Promotes a record to `verified`, but only while it is still pending
    /// and unexpired. The filtered update is the concurrency guard: of two
    /// racing claims exactly one sees a row, the other gets NotFound.
    pub async fn claim_pending<C: ConnectionTrait>(
        &self,
        conn: &C,
        session_id: &str,
    ) -> Result<PendingPaymentModel, ServiceError> {
        let now = Utc::now();

        let result = PendingPaymentEntity::update_many()
            .set(pending_payment::ActiveModel {
                status: Set(PendingPaymentStatus::Verified),
                ..Default::default()
            })
            .filter(pending_payment::Column::SessionId.eq(session_id))
            .filter(pending_payment::Column::Status.eq(PendingPaymentStatus::Pending))
            .filter(pending_payment::Column::ExpiresAt.gt(now))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "No pending payment found for session {}",
                session_id
            )));
        }

        let record = PendingPaymentEntity::find()
            .filter(pending_payment::Column::SessionId.eq(session_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "claimed pending payment {} disappeared",
                    session_id
                ))
            })?;

        info!(session_id, "pending payment claimed");
        Ok(record)
    }
}
