//! HTTP surface.
//!
//! Route tree:
//!
//! ```text
//! /cart
//!   GET    /              split cart view
//!   POST   /items         add a listing
//!   PATCH  /items/{id}    change a line's quantity
//!   DELETE /items/{id}    remove a line
//! /checkout
//!   POST /physical        cash-on-fulfillment checkout
//!   GET  /prepare         exchange-rate quote for the e-book lines
//!   POST /ebooks          verify proof and create the order
//! /orders
//!   GET /                 buyer's order history
//!   GET /{id}             single order (buyer-scoped)
//! ```
//!
//! Every route requires the authenticated-buyer header; see
//! [`crate::middleware::auth`].

pub mod cart;
pub mod checkout;
pub mod orders;

use axum::Router;
use axum::routing::{get, patch, post};

use crate::state::AppState;

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{line_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
}

fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/physical", post(checkout::physical))
        .route("/prepare", get(checkout::prepare_crypto))
        .route("/ebooks", post(checkout::settle_crypto))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{order_id}", get(orders::show))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
}
