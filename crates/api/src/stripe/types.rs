//! Wire types for the subset of the Stripe API this service uses.

use serde::Deserialize;

/// A Stripe `PaymentIntent`, as returned by the create call.
///
/// Only the fields the service reads are modeled; Stripe's response carries
/// many more, which serde ignores.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Intent identifier (`pi_...`), stored on the order/donation row.
    pub id: String,
    /// Client secret handed to Stripe.js to confirm the payment browser-side.
    pub client_secret: Option<String>,
    /// Intent status as reported by Stripe (e.g. `requires_payment_method`).
    pub status: String,
    /// Amount in minor currency units.
    pub amount: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
}

/// Stripe error envelope: `{"error": {...}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

/// The error object inside Stripe's error envelope.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}
