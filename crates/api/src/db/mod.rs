//! Database operations for the API `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `orders` - Shop orders, one row per checkout attempt
//! - `donations` - Donations, one row per donation attempt
//! - `stripe_events` - Processed webhook event ids (idempotency ledger)
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! Queries use the sqlx runtime API rather than the compile-time macros so
//! the workspace builds without a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p harborlight-cli -- migrate
//! ```

pub mod donations;
pub mod orders;
pub mod stripe_events;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use donations::DonationRepository;
pub use orders::OrderRepository;
pub use stripe_events::StripeEventRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate payment intent id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Paging and filtering parameters for admin list queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListParams {
    /// Maximum rows to return (caller clamps this; see routes).
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
    /// Restrict to a single lifecycle status.
    pub status: Option<harborlight_core::PaymentStatus>,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
