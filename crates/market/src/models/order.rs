//! Order entities.
//!
//! An order is immutable once created except for `status` and the crypto
//! payment's `chain_status`, which only verification advances. A price or
//! quantity dispute after creation is handled as a new compensating order,
//! never an edit.

use chrono::{DateTime, Utc};
use librum_core::{
    BuyerId, ChainStatus, ListingId, MinorUnits, OrderId, OrderStatus, SettlementMode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::listing::SellerRef;

/// A frozen copy of a cart line plus the seller resolved at checkout time.
///
/// The seller is re-resolved when the order is created, not taken from the
/// cart snapshot: a listing may change hands after the buyer added it, and
/// the order must reflect who was paid at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub listing_id: ListingId,
    pub title: String,
    pub unit_price_minor: MinorUnits,
    pub quantity: u32,
    pub seller: SellerRef,
}

impl OrderLine {
    /// Line total (`unit price * quantity`), `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<MinorUnits> {
        self.unit_price_minor.checked_mul(self.quantity)
    }
}

/// Payment record, discriminated by settlement method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Payment {
    /// Cash on fulfillment: the sum of line totals, no further proof.
    Cash { amount_minor: MinorUnits },
    /// Chain settlement. `crypto_amount` and `rate_used` are what the
    /// buyer claimed at settlement time, stored for display/audit only;
    /// whether the order is paid is decided by `chain_status` alone.
    Crypto {
        tx_hash: String,
        amount_minor_equivalent: MinorUnits,
        crypto_amount: Decimal,
        rate_used: Decimal,
        chain_status: ChainStatus,
    },
}

/// An order: the system of record for what was sold, to whom, at what
/// price, and whether it was paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub settlement_mode: SettlementMode,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub payment: Payment,
    pub created_at: DateTime<Utc>,
}
