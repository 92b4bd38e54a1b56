//! Domain models for the API service.

pub mod donation;
pub mod order;
pub mod session;

pub use donation::Donation;
pub use order::{Order, OrderItem, ShippingAddress, items_total};
pub use session::{CurrentAdmin, keys as session_keys};
