// Core services
pub mod checkout;
pub mod orders;
pub mod pending_payments;
pub mod recovery;

// Outbound notifications (fire-and-forget email relay)
pub mod notifications;
