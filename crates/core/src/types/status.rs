//! Status enums shared by the cart, checkout, and order models.

use serde::{Deserialize, Serialize};

/// How a listing settles payment.
///
/// Every listing belongs to exactly one rail: physical goods settle cash
/// on fulfillment, digital goods settle over the chain. A listing never
/// mixes modes, so the two rails consume disjoint cart subsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    Physical,
    Crypto,
}

/// Order lifecycle status.
///
/// `Failed` records a crypto settlement whose transaction reverted on
/// chain; the order is kept for audit, never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Shipped,
    Delivered,
    Cancelled,
}

/// Settlement status derived from a transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    /// No receipt yet: still in the mempool or unknown to the provider.
    #[default]
    Unconfirmed,
    /// Receipt present with a success status.
    Confirmed,
    /// Receipt present with a failure status (reverted).
    Failed,
}

/// The account kind that owns a listing.
///
/// Sellers come in two flavors: regular accounts and wallet-only accounts
/// that registered through the chain login flow. A `SellerId` is only
/// meaningful together with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerKind {
    Regular,
    Wallet,
}
