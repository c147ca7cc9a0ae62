use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use super::OrderDraft;

/// How long an interrupted checkout stays resumable on the same device.
pub const RESUME_WINDOW_SECS: i64 = 600;

/// Device-local snapshot of an in-flight UPI checkout, written on session
/// creation and on every rotation, deleted on successful submission or
/// explicit decline. Lets a buyer who closed the payment screen pick the
/// attempt back up without refilling the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutMirror {
    pub session_id: String,
    pub user_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub amount: Decimal,
    pub draft: OrderDraft,
}

impl CheckoutMirror {
    /// A mirror older than the resume window is dead weight: the buyer has
    /// moved on and offering a resume prompt would be noise.
    pub fn is_resumable(&self, now: DateTime<Utc>) -> bool {
        now - self.saved_at <= Duration::seconds(RESUME_WINDOW_SECS)
    }
}

/// Storage seam for checkout mirrors, keyed by device id.
pub trait MirrorStore: Send + Sync {
    fn save(&self, device_id: &str, mirror: CheckoutMirror);

    /// Returns the mirror only while it is inside the resume window; a
    /// stale mirror is silently dropped.
    fn load(&self, device_id: &str, now: DateTime<Utc>) -> Option<CheckoutMirror>;

    fn clear(&self, device_id: &str);
}

/// In-process mirror store.
#[derive(Debug, Default)]
pub struct InMemoryMirrorStore {
    entries: DashMap<String, CheckoutMirror>,
}

impl InMemoryMirrorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MirrorStore for InMemoryMirrorStore {
    fn save(&self, device_id: &str, mirror: CheckoutMirror) {
        self.entries.insert(device_id.to_string(), mirror);
    }

    fn load(&self, device_id: &str, now: DateTime<Utc>) -> Option<CheckoutMirror> {
        let entry = self.entries.get(device_id)?;
        if entry.is_resumable(now) {
            Some(entry.value().clone())
        } else {
            drop(entry);
            debug!(device_id, "dropping stale checkout mirror");
            self.entries.remove(device_id);
            None
        }
    }

    fn clear(&self, device_id: &str) {
        self.entries.remove(device_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{CartLine, ShippingDetails};
    use rust_decimal_macros::dec;

    fn mirror(saved_at: DateTime<Utc>) -> CheckoutMirror {
        CheckoutMirror {
            session_id: "1700000000000abc123".into(),
            user_id: Uuid::new_v4(),
            saved_at,
            amount: dec!(851),
            draft: OrderDraft {
                shipping: ShippingDetails {
                    name: "Asha Rao".into(),
                    email: "asha@example.com".into(),
                    phone: "9876543210".into(),
                    address: "14 MG Road".into(),
                    city: "Bengaluru".into(),
                    state: "Karnataka".into(),
                    postal_code: "560001".into(),
                },
                items: vec![CartLine {
                    product_id: Uuid::new_v4(),
                    product_name: "Block-print kurta".into(),
                    quantity: 2,
                    unit_price: dec!(425),
                    size: Some("M".into()),
                    color: None,
                }],
            },
        }
    }

    #[test]
    fn fresh_mirror_is_returned() {
        let store = InMemoryMirrorStore::new();
        let now = Utc::now();
        store.save("device-1", mirror(now));

        let loaded = store.load("device-1", now).expect("fresh mirror");
        assert_eq!(loaded.session_id, "1700000000000abc123");
    }

    #[test]
    fn stale_mirror_is_silently_dropped() {
        let store = InMemoryMirrorStore::new();
        let now = Utc::now();
        store.save(
            "device-1",
            mirror(now - Duration::seconds(RESUME_WINDOW_SECS + 1)),
        );

        assert!(store.load("device-1", now).is_none());
        // dropped, not merely hidden
        assert!(store.load("device-1", now).is_none());
    }

    #[test]
    fn clear_removes_the_mirror() {
        let store = InMemoryMirrorStore::new();
        let now = Utc::now();
        store.save("device-1", mirror(now));
        store.clear("device-1");

        assert!(store.load("device-1", now).is_none());
    }

    #[test]
    fn mirrors_are_scoped_per_device() {
        let store = InMemoryMirrorStore::new();
        let now = Utc::now();
        store.save("device-1", mirror(now));

        assert!(store.load("device-2", now).is_none());
    }
}
