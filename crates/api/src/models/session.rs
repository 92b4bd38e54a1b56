//! Session-related types.
//!
//! Types stored in the session for admin authentication state.

use serde::{Deserialize, Serialize};

use harborlight_core::Email;

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Operator email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
