//! Checkout orchestrator.
//!
//! The only component allowed to touch the cart store and the order
//! ledger in one logical operation. Two rails:
//!
//! - **Physical**: single-phase. Project the physical-mode lines, freeze
//!   them into an order, then consume them. Create-then-consume ordering
//!   makes a crash between the two steps safe to retry: a re-run sees
//!   only the lines that were never consumed and produces a second,
//!   smaller order rather than double-consuming a line.
//! - **Crypto**: two-phase. `prepare_crypto` returns an advisory quote
//!   without reserving anything; `settle_crypto` re-projects the live
//!   cart, verifies the payment proof on chain, and only consumes lines
//!   once the transaction is confirmed. A failed transaction still
//!   produces an order for audit; an unconfirmed one produces nothing.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use librum_core::{
    BuyerId, ChainStatus, LineId, MinorUnits, OrderId, OrderStatus, SellerId, SettlementMode,
};

use crate::catalog::Catalog;
use crate::models::{Cart, CartLine, Order, OrderLine, Payment};
use crate::store::{CartStore, LedgerError, OrderLedger};

use super::chain::{ChainError, ChainVerifier};
use super::rates::{RateError, RateSource};

/// Decimal places kept when converting a fiat total into coin.
const CRYPTO_SCALE: u32 = 6;

/// Checkout errors.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No lines on the requested rail.
    #[error("no items in cart")]
    EmptyCart,

    /// Crypto settlement without a transaction hash.
    #[error("transaction hash required")]
    MissingProof,

    /// The transaction has no receipt yet. Retryable: the only side
    /// effect of retrying is another verification query.
    #[error("transaction not yet confirmed")]
    PendingConfirmation,

    /// Integer overflow while summing line totals.
    #[error("amount arithmetic overflow")]
    AmountOverflow,

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A seller payable from the crypto-mode cart lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayableSeller {
    pub seller_id: SellerId,
    pub address: Option<String>,
}

/// An advisory quote for settling the crypto-mode cart lines.
///
/// Nothing is reserved: the buyer may abandon the quote, and the cart may
/// change before settlement.
#[derive(Debug, Clone)]
pub struct CryptoQuote {
    pub fiat_amount_minor: MinorUnits,
    pub crypto_amount: Decimal,
    pub rate_used: Decimal,
    pub sellers: Vec<PayableSeller>,
}

/// Request-scoped checkout orchestrator.
pub struct CheckoutService<'a> {
    carts: &'a CartStore,
    orders: &'a OrderLedger,
    catalog: &'a Catalog,
    rates: &'a dyn RateSource,
    chain: &'a dyn ChainVerifier,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        carts: &'a CartStore,
        orders: &'a OrderLedger,
        catalog: &'a Catalog,
        rates: &'a dyn RateSource,
        chain: &'a dyn ChainVerifier,
    ) -> Self {
        Self {
            carts,
            orders,
            catalog,
            rates,
            chain,
        }
    }

    /// Cash-on-fulfillment checkout of the physical-mode cart lines.
    ///
    /// Runs entirely under the buyer's checkout lock — there is no
    /// external I/O on this rail, so holding the lock across the whole
    /// read-modify-write is cheap and makes line consumption linearizable
    /// per buyer.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if no physical-mode lines
    /// remain.
    pub async fn checkout_physical(
        &self,
        buyer_id: BuyerId,
    ) -> Result<(Order, Cart), CheckoutError> {
        let lock = self.carts.buyer_lock(buyer_id);
        let _guard = lock.lock().await;

        let (physical, _) = self.carts.split_by_settlement(buyer_id, self.catalog);
        if physical.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let lines = self.freeze_lines(&physical);
        let amount_minor = order_total(&lines)?;

        let order = self.orders.insert(Order {
            id: OrderId::generate(),
            buyer_id,
            settlement_mode: SettlementMode::Physical,
            lines,
            status: OrderStatus::Pending,
            payment: Payment::Cash { amount_minor },
            created_at: Utc::now(),
        })?;

        let consumed: Vec<LineId> = physical.iter().map(|line| line.id).collect();
        let remaining = self.carts.consume_lines(buyer_id, &consumed);

        tracing::info!(%buyer_id, order_id = %order.id, "physical order created");
        Ok((order, remaining))
    }

    /// Quote the crypto-mode cart lines at the current exchange rate.
    ///
    /// Read-only: mutates neither the cart nor the ledger, and takes no
    /// lock, because the buyer may walk away from the quote.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if no crypto-mode lines exist
    /// and propagates rate oracle failures.
    pub async fn prepare_crypto(&self, buyer_id: BuyerId) -> Result<CryptoQuote, CheckoutError> {
        let (_, crypto) = self.carts.split_by_settlement(buyer_id, self.catalog);
        if crypto.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let fiat_amount_minor = cart_total(&crypto)?;
        let rate = self.rates.eur_per_coin().await?;
        // Normalize after rounding: division keeps trailing-zero scale
        // ("0.0050"), which would otherwise leak onto the wire.
        let crypto_amount = fiat_amount_minor
            .to_decimal()
            .checked_div(rate)
            .ok_or(CheckoutError::AmountOverflow)?
            .round_dp(CRYPTO_SCALE)
            .normalize();

        let sellers = crypto
            .iter()
            .filter_map(|line| {
                let listing = self.catalog.listing(line.listing_id)?;
                let profile = self.catalog.seller(listing.seller)?;
                Some(PayableSeller {
                    seller_id: profile.id,
                    address: profile.payout_address.clone(),
                })
            })
            .collect();

        Ok(CryptoQuote {
            fiat_amount_minor,
            crypto_amount,
            rate_used: rate,
            sellers,
        })
    }

    /// Settle the crypto-mode cart lines against an on-chain payment proof.
    ///
    /// The receipt is verified before the buyer lock is taken, so a slow
    /// provider never holds up the buyer's other checkouts; the lock only
    /// covers the re-projection and commit. The cart is re-projected at
    /// settlement time (not from the quote) because time has passed and
    /// the cart may have changed.
    ///
    /// `crypto_amount` and `rate_used` come from the caller and are stored
    /// for audit/display only — settlement is decided solely by the
    /// verifier's reading of the receipt.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::MissingProof`] without a transaction hash
    /// - [`CheckoutError::EmptyCart`] if no crypto-mode lines remain
    /// - [`CheckoutError::PendingConfirmation`] while the transaction has
    ///   no receipt (no order is created; retry later)
    /// - [`CheckoutError::Chain`] if the provider is unreachable
    pub async fn settle_crypto(
        &self,
        buyer_id: BuyerId,
        tx_hash: Option<&str>,
        crypto_amount: Decimal,
        rate_used: Decimal,
    ) -> Result<Order, CheckoutError> {
        let tx_hash = tx_hash
            .map(str::trim)
            .filter(|hash| !hash.is_empty())
            .ok_or(CheckoutError::MissingProof)?;

        // Fast-fail before touching the chain: nothing to settle.
        let (_, crypto) = self.carts.split_by_settlement(buyer_id, self.catalog);
        if crypto.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let chain_status = self.chain.verify_transaction(tx_hash).await?;
        let (order_status, consume) = match chain_status {
            ChainStatus::Confirmed => (OrderStatus::Paid, true),
            // A reverted transaction is a successful query with an
            // unfavorable answer: record it as an auditable order and
            // leave the cart retryable.
            ChainStatus::Failed => (OrderStatus::Failed, false),
            // Creating a pending-forever order for a transaction that may
            // never confirm is avoided deliberately.
            ChainStatus::Unconfirmed => return Err(CheckoutError::PendingConfirmation),
        };

        let lock = self.carts.buyer_lock(buyer_id);
        let _guard = lock.lock().await;

        // Re-project under the lock: the cart may have changed while the
        // provider was queried.
        let (_, crypto) = self.carts.split_by_settlement(buyer_id, self.catalog);
        if crypto.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let lines = self.freeze_lines(&crypto);
        let amount_minor_equivalent = order_total(&lines)?;

        let order = self.orders.insert(Order {
            id: OrderId::generate(),
            buyer_id,
            settlement_mode: SettlementMode::Crypto,
            lines,
            status: order_status,
            payment: Payment::Crypto {
                tx_hash: tx_hash.to_owned(),
                amount_minor_equivalent,
                crypto_amount,
                rate_used,
                chain_status,
            },
            created_at: Utc::now(),
        })?;

        if consume {
            let consumed: Vec<LineId> = crypto.iter().map(|line| line.id).collect();
            self.carts.consume_lines(buyer_id, &consumed);
        }

        tracing::info!(
            %buyer_id,
            order_id = %order.id,
            ?chain_status,
            "crypto order created"
        );
        Ok(order)
    }

    /// Freeze cart lines into order lines, re-resolving each listing's
    /// current seller. Price stays the buyer's add-time snapshot; seller
    /// attribution reflects who owns the listing now.
    fn freeze_lines(&self, cart_lines: &[CartLine]) -> Vec<OrderLine> {
        cart_lines
            .iter()
            .filter_map(|line| {
                let listing = self.catalog.listing(line.listing_id)?;
                Some(OrderLine {
                    listing_id: line.listing_id,
                    title: line.title.clone(),
                    unit_price_minor: line.unit_price_minor,
                    quantity: line.quantity,
                    seller: listing.seller,
                })
            })
            .collect()
    }
}

/// Sum cart line totals with overflow checking.
fn cart_total(lines: &[CartLine]) -> Result<MinorUnits, CheckoutError> {
    lines
        .iter()
        .try_fold(MinorUnits::ZERO, |acc, line| {
            line.line_total().and_then(|total| acc.checked_add(total))
        })
        .ok_or(CheckoutError::AmountOverflow)
}

/// Sum order line totals with overflow checking.
fn order_total(lines: &[OrderLine]) -> Result<MinorUnits, CheckoutError> {
    lines
        .iter()
        .try_fold(MinorUnits::ZERO, |acc, line| {
            line.line_total().and_then(|total| acc.checked_add(total))
        })
        .ok_or(CheckoutError::AmountOverflow)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Listing, SellerProfile, SellerRef};
    use async_trait::async_trait;
    use librum_core::{ListingId, SellerKind};
    use rust_decimal::dec;
    use std::sync::Arc;

    struct StubRates(Decimal);

    #[async_trait]
    impl RateSource for StubRates {
        async fn eur_per_coin(&self) -> Result<Decimal, RateError> {
            Ok(self.0)
        }
    }

    struct DownRates;

    #[async_trait]
    impl RateSource for DownRates {
        async fn eur_per_coin(&self) -> Result<Decimal, RateError> {
            Err(RateError::Status(503))
        }
    }

    struct StubChain(ChainStatus);

    #[async_trait]
    impl ChainVerifier for StubChain {
        async fn verify_transaction(&self, _tx_hash: &str) -> Result<ChainStatus, ChainError> {
            Ok(self.0)
        }
    }

    struct DownChain;

    #[async_trait]
    impl ChainVerifier for DownChain {
        async fn verify_transaction(&self, _tx_hash: &str) -> Result<ChainStatus, ChainError> {
            Err(ChainError::ProviderUnavailable("connection refused".into()))
        }
    }

    struct Fixture {
        catalog: Catalog,
        carts: CartStore,
        orders: OrderLedger,
        physical: Listing,
        crypto: Listing,
    }

    fn fixture() -> Fixture {
        let mut catalog = Catalog::new();

        let shop = SellerProfile {
            id: SellerId::generate(),
            kind: SellerKind::Regular,
            display_name: "Rivertown Books".to_string(),
            payout_address: None,
        };
        let wallet = SellerProfile {
            id: SellerId::generate(),
            kind: SellerKind::Wallet,
            display_name: "0xbibliophile".to_string(),
            payout_address: Some("0x7f3a".to_string()),
        };

        let physical = Listing {
            id: ListingId::generate(),
            title: "Paper Book".to_string(),
            unit_price_minor: MinorUnits::new(1000),
            settlement_mode: SettlementMode::Physical,
            seller: SellerRef {
                id: shop.id,
                kind: shop.kind,
            },
        };
        let crypto = Listing {
            id: ListingId::generate(),
            title: "E-book".to_string(),
            unit_price_minor: MinorUnits::new(500),
            settlement_mode: SettlementMode::Crypto,
            seller: SellerRef {
                id: wallet.id,
                kind: wallet.kind,
            },
        };

        catalog.add_listing(physical.clone());
        catalog.add_listing(crypto.clone());
        catalog.add_seller(shop);
        catalog.add_seller(wallet);

        Fixture {
            catalog,
            carts: CartStore::new(),
            orders: OrderLedger::new(),
            physical,
            crypto,
        }
    }

    fn add_to_cart(fx: &Fixture, buyer: BuyerId, listing: &Listing) -> LineId {
        let cart = fx
            .carts
            .add_line(buyer, listing.id, &listing.title, listing.unit_price_minor)
            .unwrap();
        cart.lines.last().unwrap().id
    }

    #[tokio::test]
    async fn test_physical_checkout_totals_and_consumes() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        let line_id = add_to_cart(&fx, buyer, &fx.physical);
        fx.carts.update_quantity(buyer, line_id, 2).unwrap();

        let rates = StubRates(dec!(2000));
        let chain = StubChain(ChainStatus::Confirmed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let (order, remaining) = service.checkout_physical(buyer).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.settlement_mode, SettlementMode::Physical);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].seller, fx.physical.seller);
        assert_eq!(
            order.payment,
            Payment::Cash {
                amount_minor: MinorUnits::new(2000)
            }
        );
        assert!(remaining.lines.is_empty());

        let (physical_left, _) = fx.carts.split_by_settlement(buyer, &fx.catalog);
        assert!(physical_left.is_empty());
    }

    #[tokio::test]
    async fn test_physical_checkout_leaves_crypto_lines() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.physical);
        add_to_cart(&fx, buyer, &fx.crypto);

        let rates = StubRates(dec!(2000));
        let chain = StubChain(ChainStatus::Confirmed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let (_, remaining) = service.checkout_physical(buyer).await.unwrap();
        assert_eq!(remaining.lines.len(), 1);
        assert_eq!(remaining.lines[0].listing_id, fx.crypto.id);
    }

    #[tokio::test]
    async fn test_physical_checkout_empty_cart() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.crypto); // wrong rail only

        let rates = StubRates(dec!(2000));
        let chain = StubChain(ChainStatus::Confirmed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let err = service.checkout_physical(buyer).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(fx.orders.list_for_buyer(buyer).is_empty());
    }

    #[tokio::test]
    async fn test_prepare_quotes_without_mutation() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.crypto); // 500 cents

        let rates = StubRates(dec!(2000));
        let chain = StubChain(ChainStatus::Confirmed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let quote = service.prepare_crypto(buyer).await.unwrap();

        // 5.00 EUR / 2000 EUR per coin = 0.0025 coin.
        assert_eq!(quote.fiat_amount_minor, MinorUnits::new(500));
        assert_eq!(quote.crypto_amount, dec!(0.0025));
        // Scale is normalized, so the string form carries no trailing zeros.
        assert_eq!(quote.crypto_amount.to_string(), "0.0025");
        assert_eq!(quote.rate_used, dec!(2000));
        assert_eq!(quote.sellers.len(), 1);
        assert_eq!(quote.sellers[0].address.as_deref(), Some("0x7f3a"));

        // Advisory only: cart untouched, no order created.
        assert_eq!(fx.carts.get_or_create(buyer).lines.len(), 1);
        assert!(fx.orders.list_for_buyer(buyer).is_empty());
    }

    #[tokio::test]
    async fn test_prepare_propagates_oracle_outage() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.crypto);

        let rates = DownRates;
        let chain = StubChain(ChainStatus::Confirmed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let err = service.prepare_crypto(buyer).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Rate(_)));
    }

    #[tokio::test]
    async fn test_settle_confirmed_consumes_lines() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.crypto);

        let rates = StubRates(dec!(2000));
        let chain = StubChain(ChainStatus::Confirmed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let order = service
            .settle_crypto(buyer, Some("0xdeadbeef"), dec!(0.0025), dec!(2000))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Paid);
        match &order.payment {
            Payment::Crypto {
                tx_hash,
                amount_minor_equivalent,
                chain_status,
                ..
            } => {
                assert_eq!(tx_hash, "0xdeadbeef");
                assert_eq!(*amount_minor_equivalent, MinorUnits::new(500));
                assert_eq!(*chain_status, ChainStatus::Confirmed);
            }
            Payment::Cash { .. } => panic!("expected crypto payment"),
        }

        let (_, crypto_left) = fx.carts.split_by_settlement(buyer, &fx.catalog);
        assert!(crypto_left.is_empty());
    }

    #[tokio::test]
    async fn test_settle_failed_receipt_keeps_lines_and_audits() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.crypto);

        let rates = StubRates(dec!(2000));
        let chain = StubChain(ChainStatus::Failed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let order = service
            .settle_crypto(buyer, Some("0xdeadbeef"), dec!(0.0025), dec!(2000))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Failed);

        // The line survives, so the buyer can retry.
        let (_, crypto_left) = fx.carts.split_by_settlement(buyer, &fx.catalog);
        assert_eq!(crypto_left.len(), 1);
        assert_eq!(fx.orders.list_for_buyer(buyer).len(), 1);
    }

    #[tokio::test]
    async fn test_settle_unconfirmed_creates_nothing() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.crypto);

        let rates = StubRates(dec!(2000));
        let chain = StubChain(ChainStatus::Unconfirmed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let err = service
            .settle_crypto(buyer, Some("0xdeadbeef"), dec!(0.0025), dec!(2000))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::PendingConfirmation));
        assert!(fx.orders.list_for_buyer(buyer).is_empty());
        let (_, crypto_left) = fx.carts.split_by_settlement(buyer, &fx.catalog);
        assert_eq!(crypto_left.len(), 1);
    }

    #[tokio::test]
    async fn test_settle_without_proof() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.crypto);

        let rates = StubRates(dec!(2000));
        let chain = StubChain(ChainStatus::Confirmed);
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        for proof in [None, Some(""), Some("   ")] {
            let err = service
                .settle_crypto(buyer, proof, dec!(0.0025), dec!(2000))
                .await
                .unwrap_err();
            assert!(matches!(err, CheckoutError::MissingProof));
        }
    }

    #[tokio::test]
    async fn test_settle_provider_outage_leaves_state_clean() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.crypto);

        let rates = StubRates(dec!(2000));
        let chain = DownChain;
        let service = CheckoutService::new(&fx.carts, &fx.orders, &fx.catalog, &rates, &chain);

        let err = service
            .settle_crypto(buyer, Some("0xdeadbeef"), dec!(0.0025), dec!(2000))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Chain(ChainError::ProviderUnavailable(_))
        ));
        assert!(fx.orders.list_for_buyer(buyer).is_empty());
        assert_eq!(fx.carts.get_or_create(buyer).lines.len(), 1);
    }

    #[tokio::test]
    async fn test_racing_physical_checkouts_consume_once() {
        let fx = fixture();
        let buyer = BuyerId::generate();
        add_to_cart(&fx, buyer, &fx.physical);

        let fx = Arc::new(fx);
        let rates: Arc<dyn RateSource> = Arc::new(StubRates(dec!(2000)));
        let chain: Arc<dyn ChainVerifier> = Arc::new(StubChain(ChainStatus::Confirmed));

        let spawn_checkout = |fx: Arc<Fixture>,
                              rates: Arc<dyn RateSource>,
                              chain: Arc<dyn ChainVerifier>| {
            tokio::spawn(async move {
                let service = CheckoutService::new(
                    &fx.carts,
                    &fx.orders,
                    &fx.catalog,
                    rates.as_ref(),
                    chain.as_ref(),
                );
                service.checkout_physical(buyer).await.map(|(order, _)| order)
            })
        };

        let first = spawn_checkout(Arc::clone(&fx), Arc::clone(&rates), Arc::clone(&chain));
        let second = spawn_checkout(Arc::clone(&fx), Arc::clone(&rates), Arc::clone(&chain));

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let empty_failures = results
            .iter()
            .filter(|r| matches!(r, Err(CheckoutError::EmptyCart)))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(empty_failures, 1);
        assert_eq!(fx.orders.list_for_buyer(buyer).len(), 1);
        assert!(fx.carts.get_or_create(buyer).lines.is_empty());
    }
}
