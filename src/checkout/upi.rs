use rust_decimal::Decimal;
use serde::Serialize;
use url::form_urlencoded;

/// UPI collect requests are always denominated in rupees.
pub const UPI_CURRENCY: &str = "INR";

/// The fields of a `upi://pay` deep link. Wallet apps are tolerant of
/// extra parameters but the field set and ordering here match what common
/// apps are known to accept: pa, pn, am, tn, cu.
#[derive(Debug, Clone, Serialize)]
pub struct UpiPaymentRequest {
    pub payee_vpa: String,
    pub payee_name: String,
    pub amount: Decimal,
    pub session_id: String,
}

impl UpiPaymentRequest {
    /// Renders the deep link consumed by UPI wallet apps. The amount is
    /// formatted with exactly two decimals and the transaction note embeds
    /// the session id so a bank statement line can be correlated back to
    /// the checkout attempt.
    pub fn to_uri(&self) -> String {
        let amount = format!("{:.2}", self.amount.round_dp(2));
        let note = format!("Order {}", self.session_id);

        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("pa", &self.payee_vpa)
            .append_pair("pn", &self.payee_name)
            .append_pair("am", &amount)
            .append_pair("tn", &note)
            .append_pair("cu", UPI_CURRENCY)
            .finish();

        format!("upi://pay?{}", query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal) -> UpiPaymentRequest {
        UpiPaymentRequest {
            payee_vpa: "storefront@upi".into(),
            payee_name: "Storefront".into(),
            amount,
            session_id: "1700000000000abc123def456".into(),
        }
    }

    #[test]
    fn uri_carries_all_fields_in_order() {
        let uri = request(dec!(851)).to_uri();
        assert!(uri.starts_with("upi://pay?pa="));

        let pa_pos = uri.find("pa=").unwrap();
        let pn_pos = uri.find("&pn=").unwrap();
        let am_pos = uri.find("&am=").unwrap();
        let tn_pos = uri.find("&tn=").unwrap();
        let cu_pos = uri.find("&cu=").unwrap();
        assert!(pa_pos < pn_pos && pn_pos < am_pos && am_pos < tn_pos && tn_pos < cu_pos);
        assert!(uri.ends_with("&cu=INR"));
    }

    #[test]
    fn amount_is_formatted_with_two_decimals() {
        assert!(request(dec!(851)).to_uri().contains("am=851.00"));
        assert!(request(dec!(1249.5)).to_uri().contains("am=1249.50"));
    }

    #[test]
    fn note_embeds_the_session_id() {
        let uri = request(dec!(851)).to_uri();
        assert!(uri.contains("1700000000000abc123def456"));
    }
}
