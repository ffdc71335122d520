//! Cart route handlers.
//!
//! Thin JSON pass-throughs over the cart store. Carts are single-writer
//! (only the owning user's requests touch them), so these handlers need no
//! locking; the checkout workflows take the per-user lock themselves.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use tamarind_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::CartLine;
use crate::state::AppState;

/// Request body for `POST /cart/add` and `POST /cart/update`.
#[derive(Debug, Deserialize)]
pub struct CartLineBody {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Request body for `POST /cart/remove`.
#[derive(Debug, Deserialize)]
pub struct RemoveLineBody {
    pub product_id: ProductId,
}

/// Response for cart listings.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
}

/// `GET /cart` - all lines for the caller.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<CartResponse>> {
    let lines = state.cart().lines(&user_id).await?;
    Ok(Json(CartResponse { lines }))
}

/// `POST /cart/add` - insert a line or increment an existing one.
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(body): Json<CartLineBody>,
) -> Result<Json<CartLine>> {
    if body.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_owned()));
    }

    // Reject obviously-unpurchasable products here; authoritative stock
    // checks happen at checkout time.
    let product = state
        .inventory()
        .get_product(body.product_id)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| AppError::BadRequest("product is not available".to_owned()))?;

    let line = state
        .cart()
        .add_line(&user_id, product.id, body.quantity)
        .await?;
    Ok(Json(line))
}

/// `POST /cart/update` - set a line's quantity.
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(body): Json<CartLineBody>,
) -> Result<Json<CartLine>> {
    if body.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_owned()));
    }

    let line = state
        .cart()
        .set_quantity(&user_id, body.product_id, body.quantity)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::BadRequest("no such cart line".to_owned())
            }
            other => AppError::Database(other),
        })?;
    Ok(Json(line))
}

/// `POST /cart/remove` - delete one line.
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(body): Json<RemoveLineBody>,
) -> Result<(StatusCode, Json<Value>)> {
    let removed = state.cart().remove_line(&user_id, body.product_id).await?;
    if !removed {
        return Err(AppError::BadRequest("no such cart line".to_owned()));
    }
    Ok((StatusCode::OK, Json(json!({ "removed": true }))))
}
