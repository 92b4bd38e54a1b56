//! Admin authentication error types.

use thiserror::Error;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is wrong. Deliberately does not say which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Neither `ADMIN_PASSWORD` nor `ADMIN_PASSWORD_HASH` was configured.
    #[error("no admin credentials configured")]
    MissingCredentials,

    /// The configured `ADMIN_PASSWORD_HASH` is not a valid PHC string.
    #[error("invalid password hash in configuration")]
    InvalidStoredHash,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,
}
