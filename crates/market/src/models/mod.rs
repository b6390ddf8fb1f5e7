//! Domain entities.

pub mod cart;
pub mod listing;
pub mod order;

pub use cart::{Cart, CartLine};
pub use listing::{Listing, SellerProfile, SellerRef};
pub use order::{Order, OrderLine, Payment};
