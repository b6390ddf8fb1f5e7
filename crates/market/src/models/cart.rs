//! Cart entities.

use chrono::{DateTime, Utc};
use librum_core::{BuyerId, LineId, ListingId, MinorUnits};
use serde::{Deserialize, Serialize};

/// A single cart line.
///
/// Title and price are snapshots taken when the line was added: a later
/// catalog price edit does not retroactively change a cart already holding
/// the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: LineId,
    pub listing_id: ListingId,
    pub title: String,
    pub unit_price_minor: MinorUnits,
    pub quantity: u32,
}

impl CartLine {
    /// Line total (`unit price * quantity`), `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<MinorUnits> {
        self.unit_price_minor.checked_mul(self.quantity)
    }
}

/// One buyer's cart.
///
/// Created lazily on first use and never deleted, only emptied. Invariant:
/// no two lines share a `listing_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub owner_id: BuyerId,
    pub lines: Vec<CartLine>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart for a buyer.
    #[must_use]
    pub fn new(owner_id: BuyerId) -> Self {
        Self {
            owner_id,
            lines: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Whether the cart already holds a line for this listing.
    #[must_use]
    pub fn contains_listing(&self, listing_id: ListingId) -> bool {
        self.lines.iter().any(|line| line.listing_id == listing_id)
    }
}
