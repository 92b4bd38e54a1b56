//! Stripe REST API client.
//!
//! Talks to `https://api.stripe.com/v1` directly with `reqwest` using
//! form-encoded bodies, which is all the payment-intent surface needs. The
//! webhook side (signature verification, event decoding) lives in
//! [`webhook`].

mod error;
pub mod types;
pub mod webhook;

pub use error::StripeError;
pub use types::PaymentIntent;

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::instrument;

use harborlight_core::Money;

use crate::config::StripeConfig;
use types::ErrorEnvelope;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// What kind of record a payment intent belongs to, carried in Stripe
/// metadata so charges are attributable from the Stripe dashboard too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    Order,
    Donation,
}

impl PaymentKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Donation => "donation",
        }
    }
}

/// Parameters for creating a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntent {
    /// Charge amount.
    pub amount: Money,
    /// Order or donation.
    pub kind: PaymentKind,
    /// Where Stripe sends its own receipt.
    pub receipt_email: Option<String>,
    /// Human-readable description shown in the dashboard.
    pub description: Option<String>,
}

/// Client for the Stripe REST API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self::with_base_url(config, STRIPE_API_BASE)
    }

    /// Create a client pointed at a different base URL (stripe-mock in tests).
    #[must_use]
    pub fn with_base_url(config: &StripeConfig, base_url: &str) -> Self {
        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                secret_key: config.secret_key.expose_secret().to_owned(),
            }),
        }
    }

    /// Create a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` for Stripe-side rejections (bad amount,
    /// bad key), `StripeError::RateLimited` on 429, `StripeError::Http` for
    /// transport failures.
    #[instrument(skip(self, params), fields(amount = params.amount.amount, kind = params.kind.as_str()))]
    pub async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, StripeError> {
        let amount = params.amount.amount.to_string();
        let mut form: Vec<(&str, &str)> = vec![
            ("amount", amount.as_str()),
            ("currency", params.amount.currency.stripe_code()),
            ("metadata[kind]", params.kind.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ];
        if let Some(email) = params.receipt_email.as_deref() {
            form.push(("receipt_email", email));
        }
        if let Some(description) = params.description.as_deref() {
            form.push(("description", description));
        }

        let response = self
            .inner
            .client
            .post(format!("{}/payment_intents", self.inner.base_url))
            .bearer_auth(&self.inner.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(StripeError::RateLimited(retry_after));
        }

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            tracing::error!(status = %status, message = %message, "Stripe rejected payment intent");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = serde_json::from_str(&body)?;
        tracing::debug!(intent_id = %intent.id, "Created payment intent");
        Ok(intent)
    }
}
