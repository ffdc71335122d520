//! Payment confirmation callback handlers.
//!
//! The wire shape of the redirect callback (query parameters `paymentKey`,
//! `orderId`, `amount`) is dictated by the gateway; these handlers only own
//! its consumption contract: validated, typed inputs to the reconciliation
//! service.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use tamarind_core::PaymentReference;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::ShippingAddress;
use crate::models::inputs::ConfirmPaymentInput;
use crate::services::PaymentReceipt;
use crate::state::AppState;

/// Query parameters of the gateway's redirect callback.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmQuery {
    pub payment_key: String,
    pub order_id: String,
    pub amount: Decimal,
}

/// JSON body of the widget's confirmation callback, which can carry the
/// shipping snapshot collected in the checkout form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBody {
    pub payment_key: String,
    pub order_id: String,
    pub amount: Decimal,
    pub shipping: Option<ShippingAddress>,
    pub note: Option<String>,
}

/// `GET /payments/confirm` - gateway redirect callback.
pub async fn confirm_redirect(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<PaymentReceipt>> {
    let input = ConfirmPaymentInput {
        payment_reference: PaymentReference::new(query.payment_key),
        order_reference: query.order_id,
        amount: query.amount,
        shipping: None,
        note: None,
    };
    let receipt = state.payments().confirm_payment(&user_id, input).await?;
    Ok(Json(receipt))
}

/// `POST /payments/confirm` - widget callback with shipping snapshot.
pub async fn confirm(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<PaymentReceipt>> {
    let input = ConfirmPaymentInput {
        payment_reference: PaymentReference::new(body.payment_key),
        order_reference: body.order_id,
        amount: body.amount,
        shipping: body.shipping,
        note: body.note,
    };
    let receipt = state.payments().confirm_payment(&user_id, input).await?;
    Ok(Json(receipt))
}
