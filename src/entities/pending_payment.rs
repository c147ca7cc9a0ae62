use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PendingPaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// Durable record of an unconfirmed UPI checkout attempt, keyed by session
/// id. Expiry is lazy: rows past `expires_at` are never swept, they are
/// filtered out of reads and report `Expired` from [`Model::effective_status`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pending_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Opaque checkout session token. The UNIQUE constraint doubles as the
    /// idempotency key for the write path.
    #[sea_orm(unique)]
    pub session_id: String,

    pub user_id: Uuid,
    pub amount: Decimal,

    /// Denormalized order draft (shipping form + cart lines) so recovery
    /// needs nothing but this row.
    pub order_data: Json,

    pub status: PendingPaymentStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Model {
    /// Status as observed at `now`, with lazy expiry applied. A row that is
    /// still `pending` in storage reads as `Expired` past its deadline.
    pub fn effective_status(&self, now: DateTime<Utc>) -> PendingPaymentStatus {
        match self.status {
            PendingPaymentStatus::Pending if self.expires_at <= now => {
                PendingPaymentStatus::Expired
            }
            status => status,
        }
    }

    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == PendingPaymentStatus::Pending
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record(created_at: DateTime<Utc>, status: PendingPaymentStatus) -> Model {
        Model {
            id: Uuid::new_v4(),
            session_id: "1700000000000abc123".to_string(),
            user_id: Uuid::new_v4(),
            amount: dec!(851),
            order_data: json!({}),
            status,
            created_at,
            expires_at: created_at + Duration::hours(24),
        }
    }

    #[test]
    fn pending_record_within_window_is_claimable() {
        let now = Utc::now();
        let rec = record(now, PendingPaymentStatus::Pending);
        assert_eq!(rec.effective_status(now), PendingPaymentStatus::Pending);
        assert!(rec.is_claimable(now));
    }

    #[test]
    fn pending_record_past_deadline_reads_expired() {
        let created = Utc::now() - Duration::hours(25);
        let rec = record(created, PendingPaymentStatus::Pending);
        let now = Utc::now();
        assert_eq!(rec.effective_status(now), PendingPaymentStatus::Expired);
        assert!(!rec.is_claimable(now));
    }

    #[test]
    fn verified_record_never_reports_expired() {
        let created = Utc::now() - Duration::hours(48);
        let rec = record(created, PendingPaymentStatus::Verified);
        assert_eq!(
            rec.effective_status(Utc::now()),
            PendingPaymentStatus::Verified
        );
    }
}
