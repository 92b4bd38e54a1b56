//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::auth::AuthError;
use crate::services::{AdminAuthService, ReceiptService};
use crate::stripe::StripeClient;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("admin auth setup failed: {0}")]
    Auth(#[from] AuthError),
    #[error("email transport setup failed: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    stripe: StripeClient,
    auth: AdminAuthService,
    receipts: Option<ReceiptService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if admin credentials are invalid or the SMTP
    /// transport cannot be configured.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let stripe = StripeClient::new(&config.stripe);
        let auth = AdminAuthService::from_config(&config.admin)?;
        let receipts = config
            .email
            .as_ref()
            .map(ReceiptService::new)
            .transpose()?;

        if receipts.is_none() {
            tracing::warn!("EMAIL_USER not set; receipt emails disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                stripe,
                auth,
                receipts,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Stripe client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Get a reference to the admin authentication service.
    #[must_use]
    pub fn auth(&self) -> &AdminAuthService {
        &self.inner.auth
    }

    /// Get the receipt email service, if configured.
    #[must_use]
    pub fn receipts(&self) -> Option<&ReceiptService> {
        self.inner.receipts.as_ref()
    }
}
