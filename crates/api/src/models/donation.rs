//! Donation model.
//!
//! Same lifecycle as an order: created `pending` at intent creation, status
//! driven from Stripe webhooks afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;

use harborlight_core::{DonationFrequency, DonationId, Email, Money, PaymentStatus};

/// A donation.
#[derive(Debug, Clone, Serialize)]
pub struct Donation {
    /// Database ID.
    pub id: DonationId,
    /// Stripe `PaymentIntent` id correlating this donation to payment status.
    pub payment_intent_id: String,
    /// Payment lifecycle status.
    pub status: PaymentStatus,
    /// Donated amount.
    pub amount: Money,
    /// Donor email (receipt destination).
    pub donor_email: Email,
    /// Donor display name, absent for anonymous gifts.
    pub donor_name: Option<String>,
    /// One-time or monthly.
    pub frequency: DonationFrequency,
    /// Optional message from the donor.
    pub message: Option<String>,
    /// Whether the donor asked not to be named publicly.
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
