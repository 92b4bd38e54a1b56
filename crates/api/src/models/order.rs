//! Shop order models.
//!
//! An order is created when checkout starts (status `pending`) and only ever
//! mutated by the Stripe webhook handler transitioning its status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harborlight_core::{Email, Money, OrderId, PaymentStatus};

/// A shop order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Database ID.
    pub id: OrderId,
    /// Stripe `PaymentIntent` id correlating this order to payment status.
    pub payment_intent_id: String,
    /// Payment lifecycle status.
    pub status: PaymentStatus,
    /// Charge total, computed server-side from the line items.
    pub amount: Money,
    /// Customer contact email (receipt destination).
    pub customer_email: Email,
    /// Customer full name.
    pub customer_name: String,
    /// Customer phone, if provided.
    pub customer_phone: Option<String>,
    /// Shipping destination.
    pub shipping_address: ShippingAddress,
    /// Purchased line items.
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single purchased line item, stored as JSONB on the order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog product identifier (owned by the SPA's content data).
    pub product_id: String,
    /// Product display name at time of purchase.
    pub name: String,
    /// Quantity purchased.
    pub quantity: u32,
    /// Unit price in minor currency units at time of purchase.
    pub unit_amount: i64,
    /// Selected variation (size, color), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
}

impl OrderItem {
    /// Line total in minor units, saturating on overflow.
    #[must_use]
    pub const fn line_total(&self) -> i64 {
        self.unit_amount.saturating_mul(self.quantity as i64)
    }
}

/// Sum of line totals in minor units, saturating on overflow.
#[must_use]
pub fn items_total(items: &[OrderItem]) -> i64 {
    items
        .iter()
        .fold(0_i64, |total, item| total.saturating_add(item.line_total()))
}

/// Shipping destination, stored as JSONB on the order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}
