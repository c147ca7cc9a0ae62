use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

const RELAY_TIMEOUT_SECS: u64 = 5;

/// Order summary JSON posted to the transactional email relay.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub recipient: String,
    pub customer_name: String,
    pub total_amount: Decimal,
    pub status: String,
    pub payment_method: String,
    pub items: Vec<OrderSummaryLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummaryLine {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Relay rejected the message: {0}")]
    Rejected(String),
}

/// Transactional email seam. The order and recovery services only ever use
/// this fire-and-forget: a failed send is logged and swallowed, never
/// surfaced to the buyer, never retried.
#[async_trait]
pub trait EmailRelay: Send + Sync {
    async fn send_order_summary(&self, summary: &OrderSummary) -> Result<(), NotificationError>;
}

/// POSTs order summaries to an HTTP relay endpoint.
pub struct HttpEmailRelay {
    client: reqwest::Client,
    relay_url: String,
}

impl HttpEmailRelay {
    pub fn new(relay_url: impl Into<String>) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RELAY_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            relay_url: relay_url.into(),
        })
    }
}

#[async_trait]
impl EmailRelay for HttpEmailRelay {
    async fn send_order_summary(&self, summary: &OrderSummary) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.relay_url)
            .json(summary)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotificationError::Rejected(format!(
                "status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Fires the confirmation email without blocking the caller. `None` relay
/// means emails are disabled for this deployment.
pub fn spawn_order_email(relay: Option<Arc<dyn EmailRelay>>, summary: OrderSummary) {
    let Some(relay) = relay else { return };
    tokio::spawn(async move {
        if let Err(err) = relay.send_order_summary(&summary).await {
            warn!(error = %err, order_id = %summary.order_id, "order confirmation email failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    struct CapturingRelay {
        tx: mpsc::UnboundedSender<Uuid>,
    }

    #[async_trait]
    impl EmailRelay for CapturingRelay {
        async fn send_order_summary(
            &self,
            summary: &OrderSummary,
        ) -> Result<(), NotificationError> {
            let _ = self.tx.send(summary.order_id);
            Ok(())
        }
    }

    struct FailingRelay;

    #[async_trait]
    impl EmailRelay for FailingRelay {
        async fn send_order_summary(&self, _: &OrderSummary) -> Result<(), NotificationError> {
            Err(NotificationError::Rejected("status 502".into()))
        }
    }

    fn summary(order_id: Uuid) -> OrderSummary {
        OrderSummary {
            order_id,
            recipient: "asha@example.com".into(),
            customer_name: "Asha Rao".into(),
            total_amount: dec!(851),
            status: "confirmed".into(),
            payment_method: "cod".into(),
            items: vec![OrderSummaryLine {
                product_name: "Block-print kurta".into(),
                quantity: 2,
                unit_price: dec!(425),
            }],
        }
    }

    #[tokio::test]
    async fn spawned_email_reaches_the_relay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let relay: Arc<dyn EmailRelay> = Arc::new(CapturingRelay { tx });
        let order_id = Uuid::new_v4();

        spawn_order_email(Some(relay), summary(order_id));

        assert_eq!(rx.recv().await, Some(order_id));
    }

    #[tokio::test]
    async fn relay_failure_is_swallowed() {
        // Must not panic the spawned task or the caller.
        spawn_order_email(Some(Arc::new(FailingRelay)), summary(Uuid::new_v4()));
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn disabled_relay_is_a_no_op() {
        spawn_order_email(None, summary(Uuid::new_v4()));
    }
}
