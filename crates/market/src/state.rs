//! Shared application state.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::MarketConfig;
use crate::services::{ChainVerifier, CheckoutService, RateSource};
use crate::store::{CartStore, OrderLedger};

/// Cheaply cloneable handle to everything a request handler needs.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MarketConfig,
    catalog: Catalog,
    carts: CartStore,
    orders: OrderLedger,
    rates: Arc<dyn RateSource>,
    chain: Arc<dyn ChainVerifier>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: MarketConfig,
        catalog: Catalog,
        rates: Arc<dyn RateSource>,
        chain: Arc<dyn ChainVerifier>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts: CartStore::new(),
                orders: OrderLedger::new(),
                rates,
                chain,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }

    #[must_use]
    pub fn orders(&self) -> &OrderLedger {
        &self.inner.orders
    }

    /// Checkout orchestrator borrowing this state's stores and adapters.
    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(
            &self.inner.carts,
            &self.inner.orders,
            &self.inner.catalog,
            self.inner.rates.as_ref(),
            self.inner.chain.as_ref(),
        )
    }
}
