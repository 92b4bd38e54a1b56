//! Donation repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use harborlight_core::{
    CurrencyCode, DonationFrequency, DonationId, Email, Money, PaymentStatus,
};

use super::{ListParams, RepositoryError};
use crate::models::Donation;

/// Fields required to create a new (pending) donation.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub payment_intent_id: String,
    pub amount: Money,
    pub donor_email: Email,
    pub donor_name: Option<String>,
    pub frequency: DonationFrequency,
    pub message: Option<String>,
    pub anonymous: bool,
}

/// Raw row shape; converted to [`Donation`] after status/currency parsing.
#[derive(sqlx::FromRow)]
struct DonationRow {
    id: i64,
    payment_intent_id: String,
    status: String,
    amount: i64,
    currency: String,
    donor_email: String,
    donor_name: Option<String>,
    frequency: String,
    message: Option<String>,
    anonymous: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DonationRow {
    fn into_donation(self) -> Result<Donation, RepositoryError> {
        let status = PaymentStatus::parse(&self.status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid donation status in database: {e}"))
        })?;
        let frequency = DonationFrequency::parse(&self.frequency).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid frequency in database: {e}"))
        })?;
        let currency = CurrencyCode::parse(&self.currency).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "invalid currency in database: {}",
                self.currency
            ))
        })?;
        let donor_email = Email::parse(&self.donor_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Donation {
            id: DonationId::new(self.id),
            payment_intent_id: self.payment_intent_id,
            status,
            amount: Money {
                amount: self.amount,
                currency,
            },
            donor_email,
            donor_name: self.donor_name,
            frequency,
            message: self.message,
            anonymous: self.anonymous,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, payment_intent_id, status, amount, currency, \
     donor_email, donor_name, frequency, message, anonymous, created_at, updated_at";

/// Repository for donation database operations.
pub struct DonationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DonationRepository<'a> {
    /// Create a new donation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending donation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the payment intent id already
    /// has a donation, `RepositoryError::Database` for other failures.
    pub async fn create(&self, new: NewDonation) -> Result<Donation, RepositoryError> {
        let row: DonationRow = sqlx::query_as(
            "INSERT INTO donations \
                 (payment_intent_id, status, amount, currency, donor_email, \
                  donor_name, frequency, message, anonymous) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, payment_intent_id, status, amount, currency, \
                       donor_email, donor_name, frequency, message, anonymous, \
                       created_at, updated_at",
        )
        .bind(&new.payment_intent_id)
        .bind(PaymentStatus::Pending.as_str())
        .bind(new.amount.amount)
        .bind(new.amount.currency.code())
        .bind(new.donor_email.as_str())
        .bind(&new.donor_name)
        .bind(new.frequency.as_str())
        .bind(&new.message)
        .bind(new.anonymous)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(
                    "payment intent already has a donation".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        row.into_donation()
    }

    /// Get a donation by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError> {
        let row: Option<DonationRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM donations WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(DonationRow::into_donation).transpose()
    }

    /// Find the donation correlated to a Stripe payment intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Donation>, RepositoryError> {
        let row: Option<DonationRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM donations WHERE payment_intent_id = $1"
        ))
        .bind(payment_intent_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(DonationRow::into_donation).transpose()
    }

    /// List donations newest first, with an optional status filter.
    ///
    /// Returns the page plus the total row count for the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, params: ListParams) -> Result<(Vec<Donation>, i64), RepositoryError> {
        let status = params.status.map(PaymentStatus::as_str);

        let rows: Vec<DonationRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM donations \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM donations WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let donations = rows
            .into_iter()
            .map(DonationRow::into_donation)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((donations, total))
    }

    /// Transition a donation's status, guarded by the expected current status.
    ///
    /// Returns `false` when no row matched (the status changed concurrently).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transition_status(
        &self,
        donation_id: DonationId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE donations SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND status = $3",
        )
        .bind(to.as_str())
        .bind(donation_id.as_i64())
        .bind(from.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
