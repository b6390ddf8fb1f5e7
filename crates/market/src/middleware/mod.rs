pub mod auth;

pub use auth::{BUYER_ID_HEADER, CurrentBuyer};
