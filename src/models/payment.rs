use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::{AppError, Result};

/// Country code every payer MSISDN must start with.
pub const PHONE_PREFIX: &str = "254";
pub const PHONE_LENGTH: usize = 12;
/// Largest single STK push the gateway accepts.
pub const MAX_TRANSACTION_AMOUNT: f64 = 150_000.0;

fn validate_phone_number(phone: &str) -> std::result::Result<(), ValidationError> {
    let well_formed = phone.len() == PHONE_LENGTH
        && phone.starts_with(PHONE_PREFIX)
        && phone.bytes().all(|b| b.is_ascii_digit());

    if well_formed {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_number");
        err.message = Some("Phone number must be 12 digits starting with 254".into());
        Err(err)
    }
}

/// Body of `POST /initiate-payment/` as it arrives on the wire.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentRequestPayload {
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: String,

    #[validate(range(
        exclusive_min = 0.0,
        max = 150000.0,
        message = "Amount must be greater than 0 and at most 150000"
    ))]
    pub amount: f64,

    #[validate(length(min = 1, max = 12, message = "Account reference must be 1-12 characters"))]
    pub account_reference: String,
}

/// A payment request that has passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    phone_number: String,
    amount: f64,
    account_reference: String,
}

impl PaymentRequest {
    pub fn new(
        phone_number: impl Into<String>,
        amount: f64,
        account_reference: impl Into<String>,
    ) -> Result<Self> {
        PaymentRequest::try_from(PaymentRequestPayload {
            phone_number: phone_number.into(),
            amount,
            account_reference: account_reference.into(),
        })
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn account_reference(&self) -> &str {
        &self.account_reference
    }

    /// Amount as the gateway wants it: a whole number of shillings.
    /// Fractions round up so a valid amount never turns into 0.
    pub fn amount_for_gateway(&self) -> String {
        format!("{}", self.amount.ceil() as u64)
    }

    pub fn transaction_desc(&self) -> String {
        format!("Payment for {}", self.account_reference)
    }
}

impl TryFrom<PaymentRequestPayload> for PaymentRequest {
    type Error = AppError;

    fn try_from(payload: PaymentRequestPayload) -> Result<Self> {
        if !payload.amount.is_finite() {
            return Err(AppError::invalid_data("Amount must be a finite number"));
        }
        payload.validate()?;

        Ok(PaymentRequest {
            phone_number: payload.phone_number,
            amount: payload.amount,
            account_reference: payload.account_reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_request() {
        let request = PaymentRequest::new("254712345678", 100.0, "Order123").unwrap();

        assert_eq!(request.phone_number(), "254712345678");
        assert_eq!(request.amount(), 100.0);
        assert_eq!(request.account_reference(), "Order123");
        assert_eq!(request.transaction_desc(), "Payment for Order123");
    }

    #[test]
    fn rejects_malformed_phone_numbers() {
        let bad = [
            "",
            "0712345678",
            "712345678",
            "25471234567",
            "2547123456789",
            "255712345678",
            "25471234567a",
            "+25471234567",
            "254 12345678",
        ];
        for phone in bad {
            let err = PaymentRequest::new(phone, 100.0, "Order123").unwrap_err();
            assert!(
                matches!(err, AppError::ValidationError(_)),
                "{} should be rejected",
                phone
            );
        }
    }

    #[test]
    fn amount_must_be_positive_and_within_ceiling() {
        for amount in [0.0, -1.0, -0.01, 150_000.01, 1_000_000.0, f64::NAN, f64::INFINITY] {
            assert!(
                PaymentRequest::new("254712345678", amount, "Order123").is_err(),
                "{} should be rejected",
                amount
            );
        }
        for amount in [0.01, 1.0, 99.5, MAX_TRANSACTION_AMOUNT] {
            assert!(
                PaymentRequest::new("254712345678", amount, "Order123").is_ok(),
                "{} should be accepted",
                amount
            );
        }
    }

    #[test]
    fn account_reference_is_one_to_twelve_chars() {
        assert!(PaymentRequest::new("254712345678", 10.0, "").is_err());
        assert!(PaymentRequest::new("254712345678", 10.0, "ABCDEFGHIJKLM").is_err());
        assert!(PaymentRequest::new("254712345678", 10.0, "A").is_ok());
        assert!(PaymentRequest::new("254712345678", 10.0, "ABCDEFGHIJKL").is_ok());
    }

    #[test]
    fn gateway_amount_is_a_whole_number() {
        let whole = PaymentRequest::new("254712345678", 100.0, "Order123").unwrap();
        let fractional = PaymentRequest::new("254712345678", 0.4, "Order123").unwrap();

        assert_eq!(whole.amount_for_gateway(), "100");
        assert_eq!(fractional.amount_for_gateway(), "1");
    }

    #[test]
    fn payload_deserializes_from_json() {
        let payload: PaymentRequestPayload = serde_json::from_str(
            r#"{"phone_number":"254712345678","amount":250,"account_reference":"INV-9"}"#,
        )
        .unwrap();
        let request = PaymentRequest::try_from(payload).unwrap();

        assert_eq!(request.amount_for_gateway(), "250");
    }
}
