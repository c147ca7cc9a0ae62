//! Checkout domain: the payment-session components shared by the checkout,
//! pending-payment, and recovery services.

pub mod mirror;
pub mod presenter;
pub mod session;
pub mod upi;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    /// Indian mobile numbers: exactly 10 digits, starting 6-9.
    static ref PHONE_RE: Regex = Regex::new(r"^[6-9][0-9]{9}$").unwrap();
    /// Indian postal codes: exactly 6 digits.
    static ref POSTAL_CODE_RE: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

/// One cart line, denormalized at checkout time. Price and product
/// attributes are copied into the order so later catalog edits do not
/// rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Shipping form as submitted by the buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ShippingDetails {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(regex(path = "PHONE_RE", message = "Enter a valid 10-digit mobile number"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(regex(path = "POSTAL_CODE_RE", message = "Enter a valid 6-digit postal code"))]
    pub postal_code: String,
}

/// Everything needed to turn a checkout attempt into an order: the shipping
/// form plus the cart snapshot. This is what gets denormalized into
/// `pending_payments.order_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderDraft {
    #[validate]
    pub shipping: ShippingDetails,
    #[validate]
    pub items: Vec<CartLine>,
}

impl OrderDraft {
    /// Sum of line totals, before shipping.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Order total including the shipping fee.
    pub fn total(&self) -> Decimal {
        let subtotal = self.subtotal();
        subtotal + shipping_fee(subtotal)
    }
}

/// Orders under this subtotal pay the flat shipping fee; at or above it
/// shipping is free.
pub const FREE_SHIPPING_THRESHOLD_RUPEES: i64 = 999;
const SHIPPING_FEE_RUPEES: i64 = 1;

pub fn shipping_fee(subtotal: Decimal) -> Decimal {
    if subtotal >= Decimal::from(FREE_SHIPPING_THRESHOLD_RUPEES) {
        Decimal::ZERO
    } else {
        Decimal::from(SHIPPING_FEE_RUPEES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn shipping_form() -> ShippingDetails {
        ShippingDetails {
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
            address: "14 MG Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
        }
    }

    fn draft_with_subtotal(unit_price: Decimal, quantity: i32) -> OrderDraft {
        OrderDraft {
            shipping: shipping_form(),
            items: vec![CartLine {
                product_id: Uuid::new_v4(),
                product_name: "Block-print kurta".into(),
                quantity,
                unit_price,
                size: Some("M".into()),
                color: Some("indigo".into()),
            }],
        }
    }

    #[test]
    fn subtotal_below_threshold_pays_flat_fee() {
        let draft = draft_with_subtotal(dec!(425), 2);
        assert_eq!(draft.subtotal(), dec!(850));
        assert_eq!(draft.total(), dec!(851));
    }

    #[test]
    fn subtotal_at_threshold_ships_free() {
        let draft = draft_with_subtotal(dec!(999), 1);
        assert_eq!(draft.total(), dec!(999));
    }

    #[test]
    fn valid_draft_passes_validation() {
        assert!(draft_with_subtotal(dec!(425), 2).validate().is_ok());
    }

    #[rstest]
    #[case("98765abc43")] // letters in the middle
    #[case("5876543210")] // starts below 6
    #[case("987654321")] // nine digits
    #[case("98765432100")] // eleven digits
    #[case("")]
    fn invalid_phone_is_rejected(#[case] phone: &str) {
        let mut draft = draft_with_subtotal(dec!(425), 2);
        draft.shipping.phone = phone.into();
        assert!(draft.validate().is_err());
    }

    #[rstest]
    #[case("5600")]
    #[case("56001a")]
    #[case("5600011")]
    fn invalid_postal_code_is_rejected(#[case] postal_code: &str) {
        let mut draft = draft_with_subtotal(dec!(425), 2);
        draft.shipping.postal_code = postal_code.into();
        assert!(draft.validate().is_err());
    }
}
