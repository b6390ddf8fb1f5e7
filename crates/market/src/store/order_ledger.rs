//! Order ledger: append-mostly system of record for orders.
//!
//! Orders are inserted exactly once per checkout and never edited by the
//! buyer afterwards; only verification advances their status, and that
//! happens before insertion here.

use std::sync::RwLock;

use thiserror::Error;

use librum_core::{BuyerId, OrderId};

use crate::models::Order;

/// Ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed order data. Fails loudly at the boundary instead of
    /// being silently "fixed".
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// In-memory order ledger.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: RwLock<Vec<Order>>,
}

impl OrderLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DataCorruption`] for an order with no lines.
    pub fn insert(&self, order: Order) -> Result<Order, LedgerError> {
        if order.lines.is_empty() {
            return Err(LedgerError::DataCorruption(format!(
                "order {} has no lines",
                order.id
            )));
        }

        let mut orders = self.orders.write().expect("order ledger lock poisoned");
        orders.push(order.clone());
        Ok(order)
    }

    /// Look up an order by ID.
    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<Order> {
        let orders = self.orders.read().expect("order ledger lock poisoned");
        orders.iter().find(|order| order.id == id).cloned()
    }

    /// All of a buyer's orders, newest first.
    #[must_use]
    pub fn list_for_buyer(&self, buyer_id: BuyerId) -> Vec<Order> {
        let orders = self.orders.read().expect("order ledger lock poisoned");
        let mut result: Vec<Order> = orders
            .iter()
            .filter(|order| order.buyer_id == buyer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }
}
