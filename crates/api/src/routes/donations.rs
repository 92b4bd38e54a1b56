//! Donation route handlers.
//!
//! Mirrors order checkout: create a Stripe `PaymentIntent` for the gift and
//! persist the pending donation row. Monthly gifts are charged once here;
//! recurring billing is set up donor-side from the Stripe receipt.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use harborlight_core::{CurrencyCode, DonationFrequency, DonationId, Email, Money};

use crate::db::donations::{DonationRepository, NewDonation};
use crate::error::AppError;
use crate::state::AppState;
use crate::stripe::{CreatePaymentIntent, PaymentKind};

/// Longest donor message we store, in characters.
const MAX_MESSAGE_CHARS: usize = 1000;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Donation request body. `amount` is in minor currency units (cents).
#[derive(Debug, Deserialize)]
pub struct CreateDonationRequest {
    pub amount: i64,
    pub donor_email: String,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub frequency: DonationFrequency,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

/// Donation response body; `client_secret` goes to Stripe.js.
#[derive(Debug, Serialize)]
pub struct CreateDonationResponse {
    pub donation_id: DonationId,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/donations/create-payment-intent`
#[instrument(skip(state, req), fields(amount = req.amount))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateDonationRequest>,
) -> Result<Json<CreateDonationResponse>, AppError> {
    let donor_email = Email::parse(&req.donor_email)
        .map_err(|e| AppError::BadRequest(format!("invalid donor email: {e}")))?;

    let amount = Money::chargeable(req.amount, CurrencyCode::Usd)
        .map_err(|e| AppError::BadRequest(format!("invalid donation amount: {e}")))?;

    let message = match req.message {
        Some(m) => {
            let m = m.trim().to_owned();
            if m.chars().count() > MAX_MESSAGE_CHARS {
                return Err(AppError::BadRequest(format!(
                    "message cannot exceed {MAX_MESSAGE_CHARS} characters"
                )));
            }
            (!m.is_empty()).then_some(m)
        }
        None => None,
    };

    let intent = state
        .stripe()
        .create_payment_intent(&CreatePaymentIntent {
            amount,
            kind: PaymentKind::Donation,
            receipt_email: Some(donor_email.as_str().to_owned()),
            description: Some(match req.frequency {
                DonationFrequency::OneTime => "Harborlight donation".to_owned(),
                DonationFrequency::Monthly => "Harborlight monthly donation".to_owned(),
            }),
        })
        .await?;

    let client_secret = intent.client_secret.clone().ok_or_else(|| {
        AppError::Internal("Stripe returned a payment intent without a client secret".into())
    })?;

    let donation = DonationRepository::new(state.pool())
        .create(NewDonation {
            payment_intent_id: intent.id,
            amount,
            donor_email,
            donor_name: req.donor_name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()),
            frequency: req.frequency,
            message,
            anonymous: req.anonymous,
        })
        .await?;

    info!(
        donation_id = %donation.id,
        payment_intent_id = %donation.payment_intent_id,
        amount = donation.amount.amount,
        frequency = donation.frequency.as_str(),
        "donation created"
    );

    Ok(Json(CreateDonationResponse {
        donation_id: donation.id,
        client_secret,
        amount: donation.amount.amount,
        currency: donation.amount.currency.code().to_owned(),
    }))
}
