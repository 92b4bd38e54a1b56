//! Stripe client error types.

use thiserror::Error;

/// Errors that can occur when calling the Stripe REST API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe returned an error response.
    #[error("stripe api error ({status}): {message}")]
    Api {
        /// HTTP status returned by Stripe.
        status: u16,
        /// Stripe's human-readable error message.
        message: String,
    },

    /// Stripe asked us to back off.
    #[error("rate limited by stripe (retry after {0}s)")]
    RateLimited(u64),

    /// Response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}
