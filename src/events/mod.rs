use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Events emitted by the checkout and order services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Checkout session events
    CheckoutSessionStarted {
        session_id: String,
        user_id: Uuid,
    },
    CheckoutSessionRotated {
        previous_session_id: String,
        session_id: String,
    },

    // Pending payment events
    PendingPaymentCreated {
        session_id: String,
    },
    PendingPaymentVerified {
        session_id: String,
        order_id: Uuid,
    },

    // Order events
    OrderCreated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes the event stream for the lifetime of the process, logging each
/// lifecycle transition. Spawned once at startup.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::CheckoutSessionStarted {
                session_id,
                user_id,
            } => {
                info!(%session_id, %user_id, "checkout session started");
            }
            Event::CheckoutSessionRotated {
                previous_session_id,
                session_id,
            } => {
                info!(%previous_session_id, %session_id, "checkout session rotated");
            }
            Event::PendingPaymentCreated { session_id } => {
                info!(%session_id, "pending payment recorded");
            }
            Event::PendingPaymentVerified {
                session_id,
                order_id,
            } => {
                info!(%session_id, %order_id, "pending payment verified");
            }
            Event::OrderCreated(order_id) => {
                info!(%order_id, "order created");
            }
        }
        debug!(?event, "event processed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender
            .send(Event::OrderCreated(Uuid::new_v4()))
            .await
            .expect("send should succeed while receiver is alive");

        assert!(matches!(rx.recv().await, Some(Event::OrderCreated(_))));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender
            .send(Event::PendingPaymentCreated {
                session_id: "1700000000000abc".into(),
            })
            .await;
        assert!(result.is_err());
    }
}
