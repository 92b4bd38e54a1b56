//! Payment lifecycle statuses for orders and donations.
//!
//! Both entities share a single lifecycle driven by Stripe webhook events.
//! Transitions are validated here so the webhook handler stays idempotent:
//! replaying an event the record has already absorbed is a no-op, and events
//! arriving out of order cannot resurrect a terminal record.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error parsing a status or frequency from its text form.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unrecognized value: {0}")]
pub struct StatusParseError(pub String);

/// Payment status of an order or donation.
///
/// Stored as lowercase text in the database and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// PaymentIntent created, awaiting confirmation.
    Pending,
    /// Payment captured.
    Succeeded,
    /// Payment attempt failed. Stripe may retry the same intent.
    Failed,
    /// Intent canceled before capture. Terminal.
    Canceled,
    /// Payment captured and later fully refunded. Terminal.
    Refunded,
}

impl PaymentStatus {
    /// Text form used in database columns and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Refunded => "refunded",
        }
    }

    /// Parse from the database/wire text form.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for any string outside the five
    /// lifecycle values.
    pub fn parse(s: &str) -> Result<Self, StatusParseError> {
        match s {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "canceled" => Ok(Self::Canceled),
            "refunded" => Ok(Self::Refunded),
            other => Err(StatusParseError(other.to_owned())),
        }
    }

    /// Whether moving from `self` to `next` is a legal lifecycle transition.
    ///
    /// A transition to the current status is always legal (and a no-op),
    /// which is what makes webhook redelivery idempotent.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        // Redelivered event for a state we already hold.
        if self as u8 == next as u8 {
            return true;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Succeeded | Self::Failed | Self::Canceled)
                // A failed attempt can still succeed on retry of the same intent.
                | (Self::Failed, Self::Succeeded)
                | (Self::Succeeded, Self::Refunded)
        )
    }

    /// Whether this status can never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Canceled | Self::Refunded)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a donation recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DonationFrequency {
    /// A single charge.
    #[default]
    OneTime,
    /// Recurring monthly gift.
    Monthly,
}

impl DonationFrequency {
    /// Text form used in database columns and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Monthly => "monthly",
        }
    }

    /// Parse from the database/wire text form.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for unknown values.
    pub fn parse(s: &str) -> Result<Self, StatusParseError> {
        match s {
            "one_time" => Ok(Self::OneTime),
            "monthly" => Ok(Self::Monthly),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

impl fmt::Display for DonationFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
