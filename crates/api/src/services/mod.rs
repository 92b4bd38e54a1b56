//! Application services.

pub mod auth;
pub mod receipts;

pub use auth::AdminAuthService;
pub use receipts::ReceiptService;
