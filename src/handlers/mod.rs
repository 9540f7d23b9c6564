//! Request handlers
//!
//! Thin layer between the router and the services: extract, validate,
//! delegate, wrap in [`crate::models::ApiResponse`].

mod clients;
mod documents;
mod gold_items;
mod gold_price;
mod loans;
mod notifications;
mod payments;
mod users;

pub use clients::*;
pub use documents::*;
pub use gold_items::*;
pub use gold_price::*;
pub use loans::*;
pub use notifications::*;
pub use payments::*;
pub use users::*;
