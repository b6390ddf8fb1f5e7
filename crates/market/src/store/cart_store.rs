//! Cart store: one active cart per buyer.
//!
//! Carts are created lazily on first use and never deleted, only emptied.
//! All data access is short, synchronous critical sections; no lock is
//! held across an await point. Checkout serialization is a separate
//! per-buyer async mutex handed out by [`CartStore::buyer_lock`], so two
//! buyers never contend while two checkouts for one buyer do.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use librum_core::{BuyerId, LineId, ListingId, MinorUnits, SettlementMode};

use crate::catalog::Catalog;
use crate::models::{Cart, CartLine};

/// Cart operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The listing is already in the cart. Re-adding is a user error,
    /// not a quantity bump.
    #[error("listing already in cart")]
    AlreadyInCart,
    /// No line with that ID in the buyer's cart.
    #[error("cart line not found")]
    LineNotFound,
    /// Quantity below 1.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// In-memory cart store.
#[derive(Debug, Default)]
pub struct CartStore {
    carts: RwLock<HashMap<BuyerId, Cart>>,
    /// One lock per buyer; serializes checkout read-modify-write for a
    /// single buyer without blocking other buyers. Entries are never
    /// evicted — a few bytes per buyer that ever checked out, same
    /// lifetime as the carts map above.
    checkout_locks: Mutex<HashMap<BuyerId, Arc<AsyncMutex<()>>>>,
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the buyer's cart, creating an empty one if absent.
    pub fn get_or_create(&self, owner_id: BuyerId) -> Cart {
        let mut carts = self.carts.write().expect("cart store lock poisoned");
        carts
            .entry(owner_id)
            .or_insert_with(|| Cart::new(owner_id))
            .clone()
    }

    /// Add a line for a listing with its snapshotted title and price.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyInCart`] if the cart already holds a
    /// line for this listing; the cart is left unchanged.
    pub fn add_line(
        &self,
        owner_id: BuyerId,
        listing_id: ListingId,
        title: &str,
        unit_price_minor: MinorUnits,
    ) -> Result<Cart, CartError> {
        let mut carts = self.carts.write().expect("cart store lock poisoned");
        let cart = carts
            .entry(owner_id)
            .or_insert_with(|| Cart::new(owner_id));

        if cart.contains_listing(listing_id) {
            return Err(CartError::AlreadyInCart);
        }

        cart.lines.push(CartLine {
            id: LineId::generate(),
            listing_id,
            title: title.to_owned(),
            unit_price_minor,
            quantity: 1,
        });
        cart.updated_at = Utc::now();
        Ok(cart.clone())
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for quantities below 1 and
    /// [`CartError::LineNotFound`] if the line is absent.
    pub fn update_quantity(
        &self,
        owner_id: BuyerId,
        line_id: LineId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let mut carts = self.carts.write().expect("cart store lock poisoned");
        let cart = carts
            .entry(owner_id)
            .or_insert_with(|| Cart::new(owner_id));

        let line = cart
            .lines
            .iter_mut()
            .find(|line| line.id == line_id)
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity;
        cart.updated_at = Utc::now();
        Ok(cart.clone())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the line is absent; removing
    /// twice errors the second time but leaves the rest of the cart intact.
    pub fn remove_line(&self, owner_id: BuyerId, line_id: LineId) -> Result<Cart, CartError> {
        let mut carts = self.carts.write().expect("cart store lock poisoned");
        let cart = carts
            .entry(owner_id)
            .or_insert_with(|| Cart::new(owner_id));

        let before = cart.lines.len();
        cart.lines.retain(|line| line.id != line_id);
        if cart.lines.len() == before {
            return Err(CartError::LineNotFound);
        }
        cart.updated_at = Utc::now();
        Ok(cart.clone())
    }

    /// Read-only projection of the cart split by the listings' settlement
    /// modes: `(physical, crypto)`. Lines whose listing is gone from the
    /// catalog are skipped, not errors.
    pub fn split_by_settlement(
        &self,
        owner_id: BuyerId,
        catalog: &Catalog,
    ) -> (Vec<CartLine>, Vec<CartLine>) {
        let carts = self.carts.read().expect("cart store lock poisoned");
        let Some(cart) = carts.get(&owner_id) else {
            return (Vec::new(), Vec::new());
        };

        let mut physical = Vec::new();
        let mut crypto = Vec::new();
        for line in &cart.lines {
            match catalog.listing(line.listing_id).map(|l| l.settlement_mode) {
                Some(SettlementMode::Physical) => physical.push(line.clone()),
                Some(SettlementMode::Crypto) => crypto.push(line.clone()),
                None => {}
            }
        }
        (physical, crypto)
    }

    /// Remove consumed lines after a checkout commits. A line that is
    /// already gone (removed by a concurrent request) is a per-line no-op
    /// and does not block consumption of the rest.
    pub fn consume_lines(&self, owner_id: BuyerId, line_ids: &[LineId]) -> Cart {
        let mut carts = self.carts.write().expect("cart store lock poisoned");
        let cart = carts
            .entry(owner_id)
            .or_insert_with(|| Cart::new(owner_id));
        cart.lines.retain(|line| !line_ids.contains(&line.id));
        cart.updated_at = Utc::now();
        cart.clone()
    }

    /// Per-buyer checkout lock (single-writer-per-key).
    ///
    /// Hold the returned mutex across a checkout's read-modify-write; do
    /// not hold it across external I/O.
    pub fn buyer_lock(&self, owner_id: BuyerId) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .checkout_locks
            .lock()
            .expect("cart store lock poisoned");
        locks.entry(owner_id).or_default().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Listing, SellerRef};
    use librum_core::{SellerId, SellerKind};

    fn listing(mode: SettlementMode, cents: i64) -> Listing {
        Listing {
            id: ListingId::generate(),
            title: "A Book".to_string(),
            unit_price_minor: MinorUnits::new(cents),
            settlement_mode: mode,
            seller: SellerRef {
                id: SellerId::generate(),
                kind: SellerKind::Regular,
            },
        }
    }

    #[test]
    fn test_get_or_create_is_lazy_and_idempotent() {
        let store = CartStore::new();
        let buyer = BuyerId::generate();

        let cart = store.get_or_create(buyer);
        assert!(cart.lines.is_empty());
        assert_eq!(store.get_or_create(buyer).owner_id, buyer);
    }

    #[test]
    fn test_add_same_listing_twice_is_rejected() {
        let store = CartStore::new();
        let buyer = BuyerId::generate();
        let listing_id = ListingId::generate();

        store
            .add_line(buyer, listing_id, "A Book", MinorUnits::new(1000))
            .unwrap();
        let err = store
            .add_line(buyer, listing_id, "A Book", MinorUnits::new(1000))
            .unwrap_err();

        assert_eq!(err, CartError::AlreadyInCart);
        assert_eq!(store.get_or_create(buyer).lines.len(), 1);
    }

    #[test]
    fn test_update_quantity() {
        let store = CartStore::new();
        let buyer = BuyerId::generate();
        let cart = store
            .add_line(buyer, ListingId::generate(), "A Book", MinorUnits::new(500))
            .unwrap();
        let line_id = cart.lines[0].id;

        let cart = store.update_quantity(buyer, line_id, 3).unwrap();
        assert_eq!(cart.lines[0].quantity, 3);

        assert_eq!(
            store.update_quantity(buyer, line_id, 0).unwrap_err(),
            CartError::InvalidQuantity
        );
        assert_eq!(
            store
                .update_quantity(buyer, LineId::generate(), 2)
                .unwrap_err(),
            CartError::LineNotFound
        );
    }

    #[test]
    fn test_remove_twice_errors_second_time_without_side_effects() {
        let store = CartStore::new();
        let buyer = BuyerId::generate();
        store
            .add_line(buyer, ListingId::generate(), "Keep", MinorUnits::new(100))
            .unwrap();
        let cart = store
            .add_line(buyer, ListingId::generate(), "Drop", MinorUnits::new(200))
            .unwrap();
        let drop_id = cart.lines[1].id;

        let cart = store.remove_line(buyer, drop_id).unwrap();
        assert_eq!(cart.lines.len(), 1);

        assert_eq!(
            store.remove_line(buyer, drop_id).unwrap_err(),
            CartError::LineNotFound
        );
        assert_eq!(store.get_or_create(buyer).lines.len(), 1);
    }

    #[test]
    fn test_split_by_settlement_skips_vanished_listings() {
        let mut catalog = Catalog::new();
        let physical = listing(SettlementMode::Physical, 1000);
        let crypto = listing(SettlementMode::Crypto, 500);
        catalog.add_listing(physical.clone());
        catalog.add_listing(crypto.clone());

        let store = CartStore::new();
        let buyer = BuyerId::generate();
        store
            .add_line(buyer, physical.id, &physical.title, physical.unit_price_minor)
            .unwrap();
        store
            .add_line(buyer, crypto.id, &crypto.title, crypto.unit_price_minor)
            .unwrap();
        // A line whose listing no longer exists in the catalog.
        store
            .add_line(buyer, ListingId::generate(), "Gone", MinorUnits::new(1))
            .unwrap();

        let (physical_lines, crypto_lines) = store.split_by_settlement(buyer, &catalog);
        assert_eq!(physical_lines.len(), 1);
        assert_eq!(crypto_lines.len(), 1);
        assert_eq!(physical_lines[0].listing_id, physical.id);
        assert_eq!(crypto_lines[0].listing_id, crypto.id);
    }

    #[test]
    fn test_consume_missing_line_is_a_noop() {
        let store = CartStore::new();
        let buyer = BuyerId::generate();
        let cart = store
            .add_line(buyer, ListingId::generate(), "Stay", MinorUnits::new(100))
            .unwrap();
        let kept = cart.lines[0].id;

        let cart = store.consume_lines(buyer, &[LineId::generate()]);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].id, kept);
    }

    #[test]
    fn test_price_snapshot_survives_catalog_edit() {
        let mut catalog = Catalog::new();
        let mut book = listing(SettlementMode::Physical, 1000);
        catalog.add_listing(book.clone());

        let store = CartStore::new();
        let buyer = BuyerId::generate();
        store
            .add_line(buyer, book.id, &book.title, book.unit_price_minor)
            .unwrap();

        // Catalog price goes up after the line was added.
        book.unit_price_minor = MinorUnits::new(9999);
        catalog.add_listing(book);

        let cart = store.get_or_create(buyer);
        assert_eq!(cart.lines[0].unit_price_minor, MinorUnits::new(1000));
    }
}
