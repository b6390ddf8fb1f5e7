//! Read-only listing and seller views.
//!
//! Catalog CRUD lives in an external service; the marketplace core only
//! ever reads these shapes. A listing's owner may be a regular account or
//! a wallet-only account, so ownership is a `SellerRef` pair rather than a
//! bare ID.

use librum_core::{ListingId, MinorUnits, SellerId, SellerKind, SettlementMode};
use serde::{Deserialize, Serialize};

/// Reference to the account that owns a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerRef {
    pub id: SellerId,
    pub kind: SellerKind,
}

/// The subset of a catalog listing the core reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub unit_price_minor: MinorUnits,
    pub settlement_mode: SettlementMode,
    pub seller: SellerRef,
}

/// Seller fields the marketplace displays and pays out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerProfile {
    pub id: SellerId,
    pub kind: SellerKind,
    pub display_name: String,
    /// Chain payout address; present for wallet sellers.
    pub payout_address: Option<String>,
}
