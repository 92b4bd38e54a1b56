//! Admin route handlers.
//!
//! Session-cookie authenticated endpoints for the single operator account:
//! login/logout, a session check for the SPA, and paginated read access to
//! orders and donations.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use harborlight_core::{DonationId, OrderId, PaymentStatus};

use crate::db::ListParams;
use crate::db::donations::DonationRepository;
use crate::db::orders::OrderRepository;
use crate::error::AppError;
use crate::middleware::{OptionalAdmin, RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Donation, Order};
use crate::state::AppState;

/// Default page size for list endpoints.
const DEFAULT_PAGE_SIZE: i64 = 50;

/// Hard cap on page size.
const MAX_PAGE_SIZE: i64 = 200;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Query parameters for order/donation list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub status: Option<PaymentStatus>,
}

impl ListQuery {
    fn into_params(self) -> ListParams {
        ListParams {
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
            status: self.status,
        }
    }
}

/// Paginated list response.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total rows matching the filter, across all pages.
    pub total: i64,
}

// =============================================================================
// Session Handlers
// =============================================================================

/// `POST /api/admin/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>, AppError> {
    let admin = state.auth().login(&req.email, &req.password)?;

    // Rotate the session id so a pre-login cookie cannot be replayed.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("failed to rotate session: {e}")))?;
    set_current_admin(&session, &admin)
        .await
        .map_err(|e| AppError::Internal(format!("failed to persist session: {e}")))?;

    info!(email = %admin.email, "admin logged in");
    Ok(Json(admin))
}

/// `POST /api/admin/logout`
///
/// Accepts anonymous calls too; logging out of an expired session should
/// not fail.
#[instrument(skip_all)]
pub async fn logout(
    OptionalAdmin(admin): OptionalAdmin,
    session: Session,
) -> Result<Json<serde_json::Value>, AppError> {
    clear_current_admin(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("failed to destroy session: {e}")))?;
    if let Some(admin) = admin {
        info!(email = %admin.email, "admin logged out");
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `GET /api/admin/me`
///
/// Lets the SPA check whether its cookie still carries a live session.
pub async fn me(RequireAdmin(admin): RequireAdmin) -> Json<CurrentAdmin> {
    Json(admin)
}

// =============================================================================
// Order Handlers
// =============================================================================

/// `GET /api/admin/orders`
#[instrument(skip(state, _admin))]
pub async fn list_orders(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Order>>, AppError> {
    let (items, total) = OrderRepository::new(state.pool())
        .list(query.into_params())
        .await?;
    Ok(Json(Page { items, total }))
}

/// `GET /api/admin/orders/{id}`
#[instrument(skip(state, _admin))]
pub async fn get_order(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    OrderRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

// =============================================================================
// Donation Handlers
// =============================================================================

/// `GET /api/admin/donations`
#[instrument(skip(state, _admin))]
pub async fn list_donations(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Donation>>, AppError> {
    let (items, total) = DonationRepository::new(state.pool())
        .list(query.into_params())
        .await?;
    Ok(Json(Page { items, total }))
}

/// `GET /api/admin/donations/{id}`
#[instrument(skip(state, _admin))]
pub async fn get_donation(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<DonationId>,
) -> Result<Json<Donation>, AppError> {
    DonationRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("donation {id}")))
}
