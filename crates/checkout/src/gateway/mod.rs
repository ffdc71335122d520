//! Payment gateway client.
//!
//! The gateway is the one collaborator in the checkout core that cannot be
//! un-called: once it reports approval, money has moved. The client performs
//! a single confirmation request per invocation and never retries on its own;
//! retry/backoff policy belongs to the gateway, and a timed-out confirmation
//! is an unknown outcome that must be resolved out of band.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use tamarind_core::PaymentReference;

use crate::config::GatewayConfig;

/// Provider status string that means the payment is settled.
const APPROVED_STATUS: &str = "DONE";

/// Errors from the gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure. A timeout here is the dangerous case: the
    /// charge may have succeeded even though the response was lost.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the confirmation with a structured error.
    #[error("gateway rejected confirmation ({code}): {message}")]
    Provider { code: String, message: String },

    /// The provider returned a body the client could not interpret.
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

/// Confirmation request sent to the gateway.
#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
    pub payment_reference: PaymentReference,
    /// Client-generated provisional order identifier, echoed back to the
    /// gateway; not a local order row.
    pub order_reference: String,
    pub amount: Decimal,
}

/// Authoritative confirmation outcome from the gateway.
#[derive(Debug, Clone)]
pub struct ConfirmationOutcome {
    /// Provider status string; anything other than `DONE` is not approval.
    pub status: String,
    pub approved_at: Option<DateTime<Utc>>,
    /// Raw provider payload, kept for logging and manual reconciliation.
    pub raw: serde_json::Value,
}

impl ConfirmationOutcome {
    /// Whether the provider reports the payment as settled.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == APPROVED_STATUS
    }
}

/// Seam for the external payment confirmation call.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Confirm a payment with the provider.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or a provider-level
    /// rejection. A successful return with a non-approved status is not an
    /// error at this layer; the caller decides what to do with it.
    async fn confirm(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationOutcome, GatewayError>;
}

/// HTTPS gateway client authenticating with the server-held secret as a
/// Basic credential. The secret never reaches the browser.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    credential: String,
}

impl HttpPaymentGateway {
    /// Build the client from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        // Provider convention: secret as Basic username, empty password.
        let credential = BASE64.encode(format!("{}:", config.secret.expose_secret()));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            credential,
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn confirm(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationOutcome, GatewayError> {
        let url = format!("{}/v1/payments/confirm", self.base_url);
        let body = serde_json::json!({
            "paymentKey": request.payment_reference.as_str(),
            "orderId": request.order_reference,
            "amount": request.amount,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Basic {}", self.credential))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(decode_provider_error(status, &payload));
        }

        parse_outcome(payload)
    }
}

/// Decode the provider's structured error body, falling back to the HTTP
/// status when the body has no recognizable shape.
fn decode_provider_error(status: StatusCode, payload: &serde_json::Value) -> GatewayError {
    let code = payload
        .get("code")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_owned();
    let message = payload
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| format!("HTTP {status}"), ToOwned::to_owned);

    GatewayError::Provider { code, message }
}

fn parse_outcome(payload: serde_json::Value) -> Result<ConfirmationOutcome, GatewayError> {
    let status = payload
        .get("status")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| GatewayError::InvalidResponse("missing status field".to_owned()))?
        .to_owned();

    let approved_at = payload
        .get("approvedAt")
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(ConfirmationOutcome {
        status,
        approved_at,
        raw: payload,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_done_status_is_approved() {
        let outcome = parse_outcome(json!({
            "status": "DONE",
            "approvedAt": "2026-08-01T10:15:00+09:00",
        }))
        .unwrap();

        assert!(outcome.is_approved());
        assert!(outcome.approved_at.is_some());
    }

    #[test]
    fn test_any_other_status_is_not_approved() {
        for status in ["CANCELED", "WAITING_FOR_DEPOSIT", "EXPIRED", "done"] {
            let outcome = parse_outcome(json!({ "status": status })).unwrap();
            assert!(!outcome.is_approved(), "{status} must not count as approval");
        }
    }

    #[test]
    fn test_missing_status_is_invalid() {
        let err = parse_outcome(json!({ "approvedAt": null })).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[test]
    fn test_provider_error_decoding() {
        let err = decode_provider_error(
            StatusCode::BAD_REQUEST,
            &json!({ "code": "INVALID_PAYMENT_KEY", "message": "unknown payment key" }),
        );
        match err {
            GatewayError::Provider { code, message } => {
                assert_eq!(code, "INVALID_PAYMENT_KEY");
                assert_eq!(message, "unknown payment key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_provider_error_fallback_to_http_status() {
        let err = decode_provider_error(StatusCode::INTERNAL_SERVER_ERROR, &json!({}));
        match err {
            GatewayError::Provider { code, message } => {
                assert_eq!(code, "UNKNOWN");
                assert!(message.contains("500"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
