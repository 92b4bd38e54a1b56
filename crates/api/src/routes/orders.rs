//! Order checkout route handlers.
//!
//! Creates a Stripe `PaymentIntent` for a cart and persists the pending
//! order in the same request. The client never supplies a total; the charge
//! amount is recomputed server-side from the submitted line items.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use harborlight_core::{CurrencyCode, Email, Money, OrderId};

use crate::db::orders::{NewOrder, OrderRepository};
use crate::error::AppError;
use crate::models::{OrderItem, ShippingAddress, items_total};
use crate::state::AppState;
use crate::stripe::{CreatePaymentIntent, PaymentKind};

/// Maximum quantity accepted for a single line item.
const MAX_ITEM_QUANTITY: u32 = 100;

/// Maximum line items accepted in a single order.
const MAX_ORDER_ITEMS: usize = 50;

/// Maximum unit price accepted for a single line item, in minor units.
///
/// $100,000.00 per unit is far beyond the catalog; together with the
/// quantity and item-count caps it keeps the worst-case cart total well
/// inside `i64`.
const MAX_ITEM_UNIT_AMOUNT: i64 = 10_000_000;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_email: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
}

/// Checkout response body; `client_secret` goes to Stripe.js.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/orders/create-payment-intent`
///
/// Validates the cart, creates the Stripe `PaymentIntent`, then inserts the
/// order as `pending`. If the insert fails after the intent was created the
/// intent is left to expire on Stripe's side; it carries no captured funds.
#[instrument(skip(state, req), fields(item_count = req.items.len()))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let customer_email = Email::parse(&req.customer_email)
        .map_err(|e| AppError::BadRequest(format!("invalid customer email: {e}")))?;

    let customer_name = req.customer_name.trim().to_owned();
    if customer_name.is_empty() {
        return Err(AppError::BadRequest("customer name is required".into()));
    }

    validate_items(&req.items)?;
    validate_address(&req.shipping_address)?;

    let amount = Money::chargeable(items_total(&req.items), CurrencyCode::Usd)
        .map_err(|e| AppError::BadRequest(format!("invalid order total: {e}")))?;

    let intent = state
        .stripe()
        .create_payment_intent(&CreatePaymentIntent {
            amount,
            kind: PaymentKind::Order,
            receipt_email: Some(customer_email.as_str().to_owned()),
            description: Some(format!(
                "Harborlight shop order ({} item{})",
                req.items.len(),
                if req.items.len() == 1 { "" } else { "s" }
            )),
        })
        .await?;

    let client_secret = intent.client_secret.clone().ok_or_else(|| {
        AppError::Internal("Stripe returned a payment intent without a client secret".into())
    })?;

    let order = OrderRepository::new(state.pool())
        .create(NewOrder {
            payment_intent_id: intent.id,
            amount,
            customer_email,
            customer_name,
            customer_phone: req.customer_phone.filter(|p| !p.trim().is_empty()),
            shipping_address: req.shipping_address,
            items: req.items,
        })
        .await?;

    info!(
        order_id = %order.id,
        payment_intent_id = %order.payment_intent_id,
        amount = order.amount.amount,
        "order created"
    );

    Ok(Json(CreateOrderResponse {
        order_id: order.id,
        client_secret,
        amount: order.amount.amount,
        currency: order.amount.currency.code().to_owned(),
    }))
}

// =============================================================================
// Validation
// =============================================================================

fn validate_items(items: &[OrderItem]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::BadRequest("order must contain at least one item".into()));
    }
    if items.len() > MAX_ORDER_ITEMS {
        return Err(AppError::BadRequest(format!(
            "order cannot contain more than {MAX_ORDER_ITEMS} line items"
        )));
    }
    for item in items {
        if item.product_id.trim().is_empty() || item.name.trim().is_empty() {
            return Err(AppError::BadRequest("item product_id and name are required".into()));
        }
        if item.quantity == 0 || item.quantity > MAX_ITEM_QUANTITY {
            return Err(AppError::BadRequest(format!(
                "item quantity must be between 1 and {MAX_ITEM_QUANTITY}"
            )));
        }
        if item.unit_amount <= 0 {
            return Err(AppError::BadRequest("item unit_amount must be positive".into()));
        }
        if item.unit_amount > MAX_ITEM_UNIT_AMOUNT {
            return Err(AppError::BadRequest(format!(
                "item unit_amount cannot exceed {MAX_ITEM_UNIT_AMOUNT}"
            )));
        }
    }
    Ok(())
}

fn validate_address(address: &ShippingAddress) -> Result<(), AppError> {
    let required = [
        ("line1", &address.line1),
        ("city", &address.city),
        ("state", &address.state),
        ("postal_code", &address.postal_code),
        ("country", &address.country),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("shipping address {field} is required")));
        }
    }
    Ok(())
}
