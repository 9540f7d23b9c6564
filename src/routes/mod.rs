//! Route definitions for the AR-Rahanu API

mod client;
mod document;
mod gold_item;
mod gold_price;
mod loan;
mod notification;
mod payment;
mod user;

pub use client::client_routes;
pub use document::document_routes;
pub use gold_item::gold_item_routes;
pub use gold_price::gold_price_routes;
pub use loan::loan_routes;
pub use notification::notification_routes;
pub use payment::payment_routes;
pub use user::user_routes;
