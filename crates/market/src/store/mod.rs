//! In-memory stores for carts and orders.
//!
//! The persistence engine is deliberately abstracted away: these stores
//! expose the entity operations and invariants, nothing engine-specific.

pub mod cart_store;
pub mod order_ledger;

pub use cart_store::{CartError, CartStore};
pub use order_ledger::{LedgerError, OrderLedger};
