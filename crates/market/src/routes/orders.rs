//! Order history handlers.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use librum_core::{ListingId, MinorUnits, OrderId, OrderStatus, SettlementMode};

use crate::error::{AppError, Result};
use crate::middleware::CurrentBuyer;
use crate::models::{Order, OrderLine, Payment};
use crate::state::AppState;

use super::cart::SellerView;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub listing_id: ListingId,
    pub title: String,
    pub unit_price_minor: MinorUnits,
    pub quantity: u32,
    pub seller: Option<SellerView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub status: OrderStatus,
    pub settlement_mode: SettlementMode,
    pub payment: Payment,
    pub lines: Vec<OrderLineView>,
    pub created_at: DateTime<Utc>,
}

/// `GET /orders` response.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub results: usize,
    pub orders: Vec<OrderView>,
}

fn line_view(state: &AppState, line: &OrderLine) -> OrderLineView {
    let seller = state.catalog().seller(line.seller).map(|profile| SellerView {
        id: profile.id,
        display_name: profile.display_name.clone(),
        payout_address: profile.payout_address.clone(),
    });

    OrderLineView {
        listing_id: line.listing_id,
        title: line.title.clone(),
        unit_price_minor: line.unit_price_minor,
        quantity: line.quantity,
        seller,
    }
}

fn order_view(state: &AppState, order: &Order) -> OrderView {
    OrderView {
        id: order.id,
        status: order.status,
        settlement_mode: order.settlement_mode,
        payment: order.payment.clone(),
        lines: order.lines.iter().map(|line| line_view(state, line)).collect(),
        created_at: order.created_at,
    }
}

/// `GET /orders` — the buyer's orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
) -> Json<OrdersResponse> {
    let orders: Vec<OrderView> = state
        .orders()
        .list_for_buyer(buyer_id)
        .iter()
        .map(|order| order_view(&state, order))
        .collect();

    Json(OrdersResponse {
        results: orders.len(),
        orders,
    })
}

/// `GET /orders/{order_id}` — a single order, scoped to the buyer.
///
/// Another buyer's order answers 404, not 403: the route does not reveal
/// whether the ID exists.
pub async fn show(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = state
        .orders()
        .get(order_id)
        .filter(|order| order.buyer_id == buyer_id)
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    Ok(Json(order_view(&state, &order)))
}
