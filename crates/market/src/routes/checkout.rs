//! Checkout handlers: thin request/response adapters over
//! [`crate::services::CheckoutService`].

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use librum_core::{MinorUnits, OrderId, OrderStatus};

use crate::error::Result;
use crate::middleware::CurrentBuyer;
use crate::services::PayableSeller;
use crate::state::AppState;

use super::cart::{CartItemView, item_view};

/// `POST /checkout/physical` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalCheckoutResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Lines left in the cart after the physical lines were consumed.
    pub remaining_items: Vec<CartItemView>,
}

/// `GET /checkout/prepare` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareResponse {
    pub amount_fiat: MinorUnits,
    pub amount_crypto: Decimal,
    pub rate_used: Decimal,
    pub sellers: Vec<PayableSeller>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub tx_hash: Option<String>,
    /// Echoed from the quote; stored for audit only.
    #[serde(rename = "amountETH")]
    pub amount_eth: Option<Decimal>,
    /// Echoed from the quote; stored for audit only.
    pub rate_used: Option<Decimal>,
}

/// `POST /checkout/ebooks` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// `POST /checkout/physical`
#[tracing::instrument(skip_all)]
pub async fn physical(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
) -> Result<(StatusCode, Json<PhysicalCheckoutResponse>)> {
    let (order, remaining) = state.checkout().checkout_physical(buyer_id).await?;

    let response = PhysicalCheckoutResponse {
        order_id: order.id,
        status: order.status,
        remaining_items: remaining
            .lines
            .iter()
            .map(|line| item_view(&state, line))
            .collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /checkout/prepare`
#[tracing::instrument(skip_all)]
pub async fn prepare_crypto(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
) -> Result<Json<PrepareResponse>> {
    let quote = state.checkout().prepare_crypto(buyer_id).await?;

    Ok(Json(PrepareResponse {
        amount_fiat: quote.fiat_amount_minor,
        amount_crypto: quote.crypto_amount,
        rate_used: quote.rate_used,
        sellers: quote.sellers,
    }))
}

/// `POST /checkout/ebooks`
#[tracing::instrument(skip_all)]
pub async fn settle_crypto(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
    Json(request): Json<SettleRequest>,
) -> Result<(StatusCode, Json<SettleResponse>)> {
    let order = state
        .checkout()
        .settle_crypto(
            buyer_id,
            request.tx_hash.as_deref(),
            request.amount_eth.unwrap_or_default(),
            request.rate_used.unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SettleResponse {
            order_id: order.id,
            status: order.status,
        }),
    ))
}
