//! Cart handlers.
//!
//! Mutations answer with 201 and the full post-mutation line list so the
//! client can re-render without a follow-up fetch. The DELETE handler
//! answers 201 as well; clients depend on the uniform shape.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use librum_core::{LineId, ListingId, MinorUnits, SellerId};

use crate::error::{AppError, Result};
use crate::middleware::CurrentBuyer;
use crate::models::CartLine;
use crate::state::AppState;

/// Seller fields shown next to a cart line. The payout address is
/// present when the listing belongs to a wallet seller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerView {
    pub id: SellerId,
    pub display_name: String,
    pub payout_address: Option<String>,
}

/// A cart line enriched with its listing's current seller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: LineId,
    pub listing_id: ListingId,
    pub title: String,
    pub unit_price_minor: MinorUnits,
    pub quantity: u32,
    pub seller: Option<SellerView>,
}

/// `GET /cart` response: lines grouped by settlement rail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitCartResponse {
    pub physical_items: Vec<CartItemView>,
    pub ebook_items: Vec<CartItemView>,
}

/// Response to every cart mutation: the full post-mutation line list.
#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<CartItemView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub listing_id: ListingId,
    /// Advisory; the stored title is snapshotted from the catalog.
    pub title: Option<String>,
    /// Advisory; the stored price is snapshotted from the catalog.
    pub unit_price_minor: Option<MinorUnits>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Project a cart line into its view, resolving the seller through the
/// listing's current catalog entry.
pub(crate) fn item_view(state: &AppState, line: &CartLine) -> CartItemView {
    let seller = state
        .catalog()
        .listing(line.listing_id)
        .and_then(|listing| state.catalog().seller(listing.seller))
        .map(|profile| SellerView {
            id: profile.id,
            display_name: profile.display_name.clone(),
            payout_address: profile.payout_address.clone(),
        });

    CartItemView {
        id: line.id,
        listing_id: line.listing_id,
        title: line.title.clone(),
        unit_price_minor: line.unit_price_minor,
        quantity: line.quantity,
        seller,
    }
}

fn items_response(state: &AppState, lines: &[CartLine]) -> ItemsResponse {
    ItemsResponse {
        items: lines.iter().map(|line| item_view(state, line)).collect(),
    }
}

/// `GET /cart`
pub async fn show(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
) -> Json<SplitCartResponse> {
    let (physical, crypto) = state.carts().split_by_settlement(buyer_id, state.catalog());

    Json(SplitCartResponse {
        physical_items: physical.iter().map(|line| item_view(&state, line)).collect(),
        ebook_items: crypto.iter().map(|line| item_view(&state, line)).collect(),
    })
}

/// `POST /cart/items`
pub async fn add_item(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ItemsResponse>)> {
    // Title and price come from the catalog, never from the client.
    let listing = state
        .catalog()
        .listing(request.listing_id)
        .ok_or_else(|| AppError::NotFound("Listing not found".to_owned()))?
        .clone();

    let cart = state.carts().add_line(
        buyer_id,
        listing.id,
        &listing.title,
        listing.unit_price_minor,
    )?;

    tracing::debug!(%buyer_id, listing_id = %listing.id, "cart line added");
    Ok((StatusCode::CREATED, Json(items_response(&state, &cart.lines))))
}

/// `PUT /cart/items/{line_id}`
pub async fn update_item(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
    Path(line_id): Path<LineId>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<(StatusCode, Json<ItemsResponse>)> {
    let cart = state
        .carts()
        .update_quantity(buyer_id, line_id, request.quantity)?;
    Ok((StatusCode::CREATED, Json(items_response(&state, &cart.lines))))
}

/// `DELETE /cart/items/{line_id}`
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentBuyer(buyer_id): CurrentBuyer,
    Path(line_id): Path<LineId>,
) -> Result<(StatusCode, Json<ItemsResponse>)> {
    let cart = state.carts().remove_line(buyer_id, line_id)?;
    Ok((StatusCode::CREATED, Json(items_response(&state, &cart.lines))))
}
