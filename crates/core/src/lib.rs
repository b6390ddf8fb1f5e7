//! Librum Core - Shared types library.
//!
//! This crate provides common types used across all librum components:
//! - `market` - Marketplace backend (cart, checkout, orders)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, minor-unit prices, and
//!   the settlement/status enums shared by the cart and order models

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
