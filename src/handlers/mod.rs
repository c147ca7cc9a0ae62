pub mod checkout;
pub mod common;
pub mod health;
pub mod orders;
pub mod recovery;

use crate::{
    checkout::mirror::MirrorStore,
    db::DbPool,
    events::EventSender,
    services::{
        checkout::{CheckoutService, UpiCollectDetails},
        notifications::EmailRelay,
        orders::OrderService,
        pending_payments::PendingPaymentService,
        recovery::{ManualAssertion, RecoveryService},
    },
};
use std::sync::Arc;

/// Aggregate of the services HTTP handlers dispatch into. Every dependency
/// is injected here; nothing reaches for process-global state.
#[derive(Clone)]
pub struct AppServices {
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
    pub pending_payments: Arc<PendingPaymentService>,
    pub recovery: Arc<RecoveryService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        mirror: Arc<dyn MirrorStore>,
        email_relay: Option<Arc<dyn EmailRelay>>,
        upi: UpiCollectDetails,
    ) -> Self {
        let pending_payments =
            PendingPaymentService::new(db_pool.clone(), Some(event_sender.clone()));
        let orders = OrderService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
            email_relay.clone(),
        );
        let recovery = RecoveryService::new(
            db_pool.clone(),
            pending_payments.clone(),
            Arc::new(ManualAssertion),
            Some(event_sender.clone()),
            email_relay,
        );
        let checkout = CheckoutService::new(
            pending_payments.clone(),
            orders.clone(),
            mirror,
            upi,
            Some(event_sender),
        );

        Self {
            checkout: Arc::new(checkout),
            orders: Arc::new(orders),
            pending_payments: Arc::new(pending_payments),
            recovery: Arc::new(recovery),
        }
    }
}
