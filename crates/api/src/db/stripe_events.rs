//! Processed-webhook ledger.
//!
//! Stripe retries webhook delivery until it sees a 2xx, and can deliver the
//! same event more than once. The webhook handler checks [`seen`] before
//! doing any work and calls [`record`] only after the work completes, so a
//! failed delivery stays eligible for redelivery while a handled event id
//! turns further redeliveries into no-ops.
//!
//! [`seen`]: StripeEventRepository::seen
//! [`record`]: StripeEventRepository::record

use sqlx::PgPool;

use super::RepositoryError;

/// Repository for the `stripe_events` idempotency ledger.
pub struct StripeEventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StripeEventRepository<'a> {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether this event id has already been handled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn seen(&self, event_id: &str) -> Result<bool, RepositoryError> {
        let (seen,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM stripe_events WHERE event_id = $1)")
                .bind(event_id)
                .fetch_one(self.pool)
                .await?;

        Ok(seen)
    }

    /// Record a handled event id.
    ///
    /// `ON CONFLICT DO NOTHING` keeps concurrent deliveries of the same
    /// event from failing each other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(&self, event_id: &str, event_type: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO stripe_events (event_id, event_type) \
             VALUES ($1, $2) \
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(event_type)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
