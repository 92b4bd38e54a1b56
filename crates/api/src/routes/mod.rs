//! HTTP route handlers for the Harborlight API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness check
//! GET  /health/ready                        - Readiness check (database ping)
//!
//! # Checkout
//! POST /api/orders/create-payment-intent    - Create order + PaymentIntent
//! POST /api/donations/create-payment-intent - Create donation + PaymentIntent
//!
//! # Stripe
//! POST /api/webhooks/stripe                 - Stripe webhook receiver
//!
//! # Admin
//! POST /api/admin/login                     - Operator login
//! POST /api/admin/logout                    - Operator logout
//! GET  /api/admin/me                        - Current session check
//! GET  /api/admin/orders                    - Paginated order list
//! GET  /api/admin/orders/{id}               - Order detail
//! GET  /api/admin/donations                 - Paginated donation list
//! GET  /api/admin/donations/{id}            - Donation detail
//! ```

pub mod admin;
pub mod donations;
pub mod orders;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::rate_limit::{auth_rate_limiter, payment_rate_limiter};
use crate::state::AppState;

/// Create the checkout routes router (payment-intent creation).
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders/create-payment-intent",
            post(orders::create_payment_intent),
        )
        .route(
            "/donations/create-payment-intent",
            post(donations::create_payment_intent),
        )
        .layer(payment_rate_limiter())
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/stripe", post(webhooks::stripe_webhook))
}

/// Create the admin routes router.
///
/// The login route carries its own strict rate limiter; everything else is
/// gated by the [`crate::middleware::RequireAdmin`] extractor inside the
/// handlers.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(admin::login).layer(auth_rate_limiter()))
        .route("/admin/logout", post(admin::logout))
        .route("/admin/me", get(admin::me))
        .route("/admin/orders", get(admin::list_orders))
        .route("/admin/orders/{id}", get(admin::get_order))
        .route("/admin/donations", get(admin::list_donations))
        .route("/admin/donations/{id}", get(admin::get_donation))
}
