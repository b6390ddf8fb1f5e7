//! Read-only catalog reference.
//!
//! Listing CRUD and seller account management live in external services;
//! this is the core's view of them, resolved explicitly at the call sites
//! that need it (no lazy loading). Sellers are looked up through one map
//! per account kind rather than a runtime type tag.

use std::collections::HashMap;

use librum_core::{ListingId, MinorUnits, SellerId, SellerKind, SettlementMode};

use crate::models::{Listing, SellerProfile, SellerRef};

/// In-memory catalog view seeded at startup.
#[derive(Debug, Default)]
pub struct Catalog {
    listings: HashMap<ListingId, Listing>,
    regular_sellers: HashMap<SellerId, SellerProfile>,
    wallet_sellers: HashMap<SellerId, SellerProfile>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listing.
    pub fn add_listing(&mut self, listing: Listing) {
        self.listings.insert(listing.id, listing);
    }

    /// Register a seller, routed into the map for its kind.
    pub fn add_seller(&mut self, profile: SellerProfile) {
        match profile.kind {
            SellerKind::Regular => self.regular_sellers.insert(profile.id, profile),
            SellerKind::Wallet => self.wallet_sellers.insert(profile.id, profile),
        };
    }

    /// Look up a listing.
    #[must_use]
    pub fn listing(&self, id: ListingId) -> Option<&Listing> {
        self.listings.get(&id)
    }

    /// Resolve a seller reference through the lookup for its kind.
    #[must_use]
    pub fn seller(&self, seller: SellerRef) -> Option<&SellerProfile> {
        match seller.kind {
            SellerKind::Regular => self.regular_sellers.get(&seller.id),
            SellerKind::Wallet => self.wallet_sellers.get(&seller.id),
        }
    }

    /// Demo catalog used by the binary until the external catalog service
    /// is wired in: a couple of physical books and e-books across one
    /// regular and one wallet seller.
    #[must_use]
    pub fn seeded() -> Self {
        let mut catalog = Self::new();

        let shop_seller = SellerProfile {
            id: SellerId::generate(),
            kind: SellerKind::Regular,
            display_name: "Rivertown Books".to_string(),
            payout_address: None,
        };
        let wallet_seller = SellerProfile {
            id: SellerId::generate(),
            kind: SellerKind::Wallet,
            display_name: "0xbibliophile".to_string(),
            payout_address: Some("0x7f3a91b54cd1e4f87a6ab41c8e2f90b3d65c21aa".to_string()),
        };

        let listings = [
            (
                "The Silent Press",
                1850,
                SettlementMode::Physical,
                &shop_seller,
            ),
            (
                "Maps of Forgotten Rivers",
                2400,
                SettlementMode::Physical,
                &shop_seller,
            ),
            (
                "Letters from the Harbor (e-book)",
                950,
                SettlementMode::Crypto,
                &wallet_seller,
            ),
            (
                "A Field Guide to Night Skies (e-book)",
                1200,
                SettlementMode::Crypto,
                &wallet_seller,
            ),
        ];

        for (title, cents, mode, seller) in listings {
            catalog.add_listing(Listing {
                id: ListingId::generate(),
                title: title.to_string(),
                unit_price_minor: MinorUnits::new(cents),
                settlement_mode: mode,
                seller: SellerRef {
                    id: seller.id,
                    kind: seller.kind,
                },
            });
        }

        catalog.add_seller(shop_seller);
        catalog.add_seller(wallet_seller);
        catalog
    }
}
