use crate::{
    checkout::{
        mirror::{CheckoutMirror, MirrorStore},
        presenter::SESSION_WINDOW_SECS,
        session::generate_session_id,
        upi::UpiPaymentRequest,
        OrderDraft,
    },
    entities::order::PaymentMethod,
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::{CreateOrder, OrderDetailResponse, OrderService},
    services::pending_payments::{NewPendingPayment, PendingPaymentService},
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Where UPI collect requests are directed.
#[derive(Debug, Clone)]
pub struct UpiCollectDetails {
    pub payee_vpa: String,
    pub payee_name: String,
}

#[derive(Debug, Clone)]
pub struct StartCheckout {
    pub user_id: Uuid,
    pub device_id: String,
    pub draft: OrderDraft,
}

#[derive(Debug, Clone)]
pub struct RotateSession {
    pub user_id: Uuid,
    pub device_id: String,
    pub previous_session_id: String,
    pub draft: OrderDraft,
}

#[derive(Debug, Clone)]
pub struct SubmitOrder {
    pub user_id: Uuid,
    pub device_id: String,
    pub payment_method: PaymentMethod,
    pub payment_session_id: Option<String>,
    pub total_amount: Decimal,
    pub draft: OrderDraft,
}

/// A checkout session handed back to the payment screen: the QR payload
/// plus its countdown window.
#[derive(Debug, Clone)]
pub struct StartedCheckout {
    pub session_id: String,
    pub amount: Decimal,
    pub upi_uri: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub window_secs: u32,
}

/// Orchestrates the UPI checkout flow: mints sessions, persists pending
/// records and device mirrors, and hands submissions to the order writer.
#[derive(Clone)]
pub struct CheckoutService {
    pending_payments: PendingPaymentService,
    orders: OrderService,
    mirror: Arc<dyn MirrorStore>,
    upi: UpiCollectDetails,
    event_sender: Option<Arc<EventSender>>,
}

impl CheckoutService {
    pub fn new(
        pending_payments: PendingPaymentService,
        orders: OrderService,
        mirror: Arc<dyn MirrorStore>,
        upi: UpiCollectDetails,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            pending_payments,
            orders,
            mirror,
            upi,
            event_sender,
        }
    }

    /// Starts a UPI checkout: validates the draft, mints a session, records
    /// the pending payment, and mirrors the attempt for same-device resume.
    ///
    /// A pending-record write failure is logged and tolerated: the buyer
    /// can still pay and submit, only recovery metadata is lost.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, device_id = %input.device_id))]
    pub async fn start_checkout(
        &self,
        input: StartCheckout,
    ) -> Result<StartedCheckout, ServiceError> {
        self.validate_draft(&input.draft)?;

        let amount = input.draft.total();
        let session_id = generate_session_id();

        self.record_attempt(&session_id, input.user_id, amount, &input.draft)
            .await;
        self.save_mirror(
            &input.device_id,
            &session_id,
            input.user_id,
            amount,
            &input.draft,
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::CheckoutSessionStarted {
                    session_id: session_id.clone(),
                    user_id: input.user_id,
                })
                .await
            {
                warn!(error = %e, "failed to send checkout started event");
            }
        }

        Ok(self.session_snapshot(session_id, amount))
    }

    /// Replaces a lapsed session with a fresh one for the same draft. The
    /// rotated-away session id stays claimable until its own 24h expiry.
    #[instrument(skip(self, input), fields(device_id = %input.device_id, previous_session_id = %input.previous_session_id))]
    pub async fn rotate_session(
        &self,
        input: RotateSession,
    ) -> Result<StartedCheckout, ServiceError> {
        self.validate_draft(&input.draft)?;

        let amount = input.draft.total();
        let session_id = generate_session_id();

        self.record_attempt(&session_id, input.user_id, amount, &input.draft)
            .await;
        self.save_mirror(
            &input.device_id,
            &session_id,
            input.user_id,
            amount,
            &input.draft,
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::CheckoutSessionRotated {
                    previous_session_id: input.previous_session_id.clone(),
                    session_id: session_id.clone(),
                })
                .await
            {
                warn!(error = %e, "failed to send session rotated event");
            }
        }

        Ok(self.session_snapshot(session_id, amount))
    }

    /// Returns the mirrored checkout for this device while it is still
    /// inside the resume window.
    pub fn resume(&self, device_id: &str) -> Option<CheckoutMirror> {
        self.mirror.load(device_id, Utc::now())
    }

    /// The buyer declined to resume; forget the mirrored attempt.
    pub fn decline_resume(&self, device_id: &str) {
        self.mirror.clear(device_id);
    }

    /// Submits the order (COD directly confirmed, UPI claimed into payment
    /// review) and drops the device mirror on success.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, payment_method = %input.payment_method))]
    pub async fn submit_order(
        &self,
        input: SubmitOrder,
    ) -> Result<OrderDetailResponse, ServiceError> {
        if input.payment_method == PaymentMethod::Upi && input.payment_session_id.is_none() {
            return Err(ServiceError::ValidationError(
                "A payment session id is required for UPI orders".to_string(),
            ));
        }

        let order = self
            .orders
            .create_order(CreateOrder {
                user_id: input.user_id,
                payment_method: input.payment_method,
                payment_session_id: input.payment_session_id,
                total_amount: input.total_amount,
                draft: input.draft,
            })
            .await?;

        self.mirror.clear(&input.device_id);
        Ok(order)
    }

    fn validate_draft(&self, draft: &OrderDraft) -> Result<(), ServiceError> {
        draft
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if draft.items.is_empty() {
            return Err(ServiceError::ValidationError("Cart is empty".to_string()));
        }
        Ok(())
    }

    async fn record_attempt(&self, session_id: &str, user_id: Uuid, amount: Decimal, draft: &OrderDraft) {
        let result = self
            .pending_payments
            .create_pending_payment(NewPendingPayment {
                session_id: session_id.to_string(),
                user_id,
                amount,
                draft: draft.clone(),
            })
            .await;

        // Non-fatal: checkout continues with incomplete recovery metadata.
        if let Err(e) = result {
            error!(error = %e, session_id, "pending payment write failed; continuing checkout");
        }
    }

    fn save_mirror(
        &self,
        device_id: &str,
        session_id: &str,
        user_id: Uuid,
        amount: Decimal,
        draft: &OrderDraft,
    ) {
        self.mirror.save(
            device_id,
            CheckoutMirror {
                session_id: session_id.to_string(),
                user_id,
                saved_at: Utc::now(),
                amount,
                draft: draft.clone(),
            },
        );
    }

    fn session_snapshot(&self, session_id: String, amount: Decimal) -> StartedCheckout {
        let created_at = Utc::now();
        let upi_uri = UpiPaymentRequest {
            payee_vpa: self.upi.payee_vpa.clone(),
            payee_name: self.upi.payee_name.clone(),
            amount,
            session_id: session_id.clone(),
        }
        .to_uri();

        info!(%session_id, %amount, "checkout session issued");

        StartedCheckout {
            session_id,
            amount,
            upi_uri,
            created_at,
            expires_at: created_at + Duration::seconds(SESSION_WINDOW_SECS as i64),
            window_secs: SESSION_WINDOW_SECS,
        }
    }
}
