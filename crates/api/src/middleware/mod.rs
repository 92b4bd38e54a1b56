//! HTTP middleware: sessions, auth extractors, rate limiting.

pub mod auth;
pub mod rate_limit;
pub mod session;

pub use auth::{OptionalAdmin, RequireAdmin, clear_current_admin, set_current_admin};
pub use session::create_session_layer;
