//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use tamarind_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::inputs::CreateOrderInput;
use crate::models::{Order, OrderLine};
use crate::state::AppState;

/// Response for order detail: header plus frozen line snapshots.
#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// `POST /orders` - create a pending order from the caller's cart.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(input): Json<CreateOrderInput>,
) -> Result<Json<Order>> {
    let order = state.orders().create_order(&user_id, input).await?;
    Ok(Json(order))
}

/// `GET /orders` - the caller's orders, newest first.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Vec<Order>>> {
    let orders = state.orders().list_orders(&user_id).await?;
    Ok(Json(orders))
}

/// `GET /orders/{id}` - one order with its lines, owner-checked.
pub async fn detail(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetailResponse>> {
    let (order, lines) = state.orders().order_detail(&user_id, id).await?;
    Ok(Json(OrderDetailResponse { order, lines }))
}

/// `POST /orders/{id}/cancel` - cancel a pending order.
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = state.orders().cancel_order(&user_id, id).await?;
    Ok(Json(order))
}
