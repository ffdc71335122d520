//! Validated input types for the two order-producing workflows.
//!
//! Callers schema-validate at the HTTP boundary; the services still
//! re-validate types and bounds here before any store or gateway call.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use tamarind_core::PaymentReference;

use super::ShippingAddress;

const MAX_FIELD_LENGTH: usize = 200;
const MAX_NOTE_LENGTH: usize = 500;

/// Input validation failure. Safe to surface verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} exceeds {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("payment reference must not be empty")]
    EmptyPaymentReference,

    #[error("order reference must not be empty")]
    EmptyOrderReference,
}

fn require_field(value: &str, field: &'static str) -> Result<(), InputError> {
    if value.trim().is_empty() {
        return Err(InputError::MissingField(field));
    }
    if value.len() > MAX_FIELD_LENGTH {
        return Err(InputError::FieldTooLong {
            field,
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}

fn validate_note(note: Option<&str>) -> Result<(), InputError> {
    if let Some(note) = note
        && note.len() > MAX_NOTE_LENGTH
    {
        return Err(InputError::FieldTooLong {
            field: "note",
            max: MAX_NOTE_LENGTH,
        });
    }
    Ok(())
}

fn validate_address(shipping: &ShippingAddress) -> Result<(), InputError> {
    require_field(&shipping.recipient, "recipient")?;
    require_field(&shipping.address_line, "address_line")?;
    require_field(&shipping.postal_code, "postal_code")?;
    require_field(&shipping.phone, "phone")?;
    if let Some(detail) = &shipping.address_detail
        && detail.len() > MAX_FIELD_LENGTH
    {
        return Err(InputError::FieldTooLong {
            field: "address_detail",
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}

/// Input to order creation (pre-payment path).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub shipping: ShippingAddress,
    pub note: Option<String>,
    /// Total as the client last saw it. Compared against the freshly
    /// computed total; a mismatch means the client's view is stale.
    pub claimed_total: Option<Decimal>,
}

impl CreateOrderInput {
    /// Defensive re-validation of types and bounds.
    ///
    /// # Errors
    ///
    /// Returns `InputError` for missing or over-long fields.
    pub fn validate(&self) -> Result<(), InputError> {
        validate_address(&self.shipping)?;
        validate_note(self.note.as_deref())?;
        if let Some(total) = self.claimed_total
            && total.is_sign_negative()
        {
            return Err(InputError::NonPositiveAmount);
        }
        Ok(())
    }
}

/// Input to payment reconciliation, consumed from the gateway's callback.
///
/// `order_reference` is the client-generated provisional identifier the
/// widget passed to the gateway; it is not an order row and is only echoed
/// back to the gateway on confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentInput {
    pub payment_reference: PaymentReference,
    pub order_reference: String,
    pub amount: Decimal,
    pub shipping: Option<ShippingAddress>,
    pub note: Option<String>,
}

impl ConfirmPaymentInput {
    /// Validate all inputs before any store read or gateway call.
    ///
    /// # Errors
    ///
    /// Returns `InputError` for an empty payment/order reference, a
    /// non-positive amount, or a malformed optional address.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.payment_reference.is_empty() {
            return Err(InputError::EmptyPaymentReference);
        }
        if self.order_reference.trim().is_empty() {
            return Err(InputError::EmptyOrderReference);
        }
        if self.amount <= Decimal::ZERO {
            return Err(InputError::NonPositiveAmount);
        }
        if let Some(shipping) = &self.shipping {
            validate_address(shipping)?;
        }
        validate_note(self.note.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn address() -> ShippingAddress {
        ShippingAddress {
            recipient: "Jamie Park".to_owned(),
            address_line: "12 Orchard Road".to_owned(),
            postal_code: "04524".to_owned(),
            address_detail: Some("Apt 3B".to_owned()),
            phone: "010-1234-5678".to_owned(),
        }
    }

    #[test]
    fn test_create_order_input_valid() {
        let input = CreateOrderInput {
            shipping: address(),
            note: Some("leave at door".to_owned()),
            claimed_total: Some(dec!(20000)),
        };
        assert_eq!(input.validate(), Ok(()));
    }

    #[test]
    fn test_create_order_input_missing_recipient() {
        let mut shipping = address();
        shipping.recipient = "  ".to_owned();
        let input = CreateOrderInput {
            shipping,
            note: None,
            claimed_total: None,
        };
        assert_eq!(
            input.validate(),
            Err(InputError::MissingField("recipient"))
        );
    }

    #[test]
    fn test_create_order_input_note_too_long() {
        let input = CreateOrderInput {
            shipping: address(),
            note: Some("x".repeat(MAX_NOTE_LENGTH + 1)),
            claimed_total: None,
        };
        assert!(matches!(
            input.validate(),
            Err(InputError::FieldTooLong { field: "note", .. })
        ));
    }

    #[test]
    fn test_confirm_payment_input_valid_without_address() {
        let input = ConfirmPaymentInput {
            payment_reference: PaymentReference::new("pay_abc123"),
            order_reference: "ord_provisional_1".to_owned(),
            amount: dec!(20000),
            shipping: None,
            note: None,
        };
        assert_eq!(input.validate(), Ok(()));
    }

    #[test]
    fn test_confirm_payment_input_empty_reference() {
        let input = ConfirmPaymentInput {
            payment_reference: PaymentReference::new(""),
            order_reference: "ord_provisional_1".to_owned(),
            amount: dec!(20000),
            shipping: None,
            note: None,
        };
        assert_eq!(input.validate(), Err(InputError::EmptyPaymentReference));
    }

    #[test]
    fn test_confirm_payment_input_zero_amount() {
        let input = ConfirmPaymentInput {
            payment_reference: PaymentReference::new("pay_abc123"),
            order_reference: "ord_provisional_1".to_owned(),
            amount: Decimal::ZERO,
            shipping: None,
            note: None,
        };
        assert_eq!(input.validate(), Err(InputError::NonPositiveAmount));
    }
}
