//! Monetary amounts in minor currency units.
//!
//! Charge amounts flow through Stripe as integer minor units (cents for USD),
//! so [`Money`] stores an `i64` rather than a decimal. Display formatting
//! assumes the two-decimal currencies this project accepts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is zero or negative.
    #[error("amount must be positive, got {0}")]
    NotPositive(i64),
    /// The amount is below the minimum chargeable amount.
    #[error("amount must be at least {min} minor units, got {got}")]
    BelowMinimum {
        /// Minimum chargeable amount in minor units.
        min: i64,
        /// The rejected amount.
        got: i64,
    },
}

/// A monetary amount in minor units (e.g. cents) with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (e.g., cents for USD).
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Money {
    /// Stripe rejects charges below 50 cents; we also treat sub-dollar
    /// donations as input mistakes.
    pub const MIN_CHARGE_MINOR_UNITS: i64 = 100;

    /// Create a `Money` from a positive amount in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::NotPositive`] if `amount <= 0`.
    pub const fn from_minor_units(amount: i64, currency: CurrencyCode) -> Result<Self, MoneyError> {
        if amount <= 0 {
            return Err(MoneyError::NotPositive(amount));
        }
        Ok(Self { amount, currency })
    }

    /// Create a `Money` enforcing the minimum chargeable amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::NotPositive`] for zero/negative amounts and
    /// [`MoneyError::BelowMinimum`] for amounts under
    /// [`Self::MIN_CHARGE_MINOR_UNITS`].
    pub const fn chargeable(amount: i64, currency: CurrencyCode) -> Result<Self, MoneyError> {
        if amount <= 0 {
            return Err(MoneyError::NotPositive(amount));
        }
        if amount < Self::MIN_CHARGE_MINOR_UNITS {
            return Err(MoneyError::BelowMinimum {
                min: Self::MIN_CHARGE_MINOR_UNITS,
                got: amount,
            });
        }
        Ok(Self { amount, currency })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{:02}",
            self.currency.symbol(),
            self.amount / 100,
            self.amount % 100
        )
    }
}

/// ISO 4217 currency codes accepted for orders and donations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
}

impl CurrencyCode {
    /// Uppercase ISO 4217 code (e.g. `"USD"`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
        }
    }

    /// Lowercase code as Stripe's API expects (e.g. `"usd"`).
    #[must_use]
    pub const fn stripe_code(self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Eur => "eur",
            Self::Gbp => "gbp",
            Self::Cad => "cad",
            Self::Aud => "aud",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Usd | Self::Cad | Self::Aud => "$",
            Self::Eur => "\u{20ac}",
            Self::Gbp => "\u{a3}",
        }
    }

    /// Parse a currency code, accepting either case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            "GBP" => Some(Self::Gbp),
            "CAD" => Some(Self::Cad),
            "AUD" => Some(Self::Aud),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
