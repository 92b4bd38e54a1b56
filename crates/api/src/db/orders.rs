//! Order repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use harborlight_core::{CurrencyCode, Email, Money, OrderId, PaymentStatus};

use super::{ListParams, RepositoryError};
use crate::models::order::{Order, OrderItem, ShippingAddress};

/// Fields required to create a new (pending) order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub payment_intent_id: String,
    pub amount: Money,
    pub customer_email: Email,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
}

/// Raw row shape; converted to [`Order`] after status/currency parsing.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    payment_intent_id: String,
    status: String,
    amount: i64,
    currency: String,
    customer_email: String,
    customer_name: String,
    customer_phone: Option<String>,
    shipping_address: Json<ShippingAddress>,
    items: Json<Vec<OrderItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, RepositoryError> {
        let status = PaymentStatus::parse(&self.status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let currency = CurrencyCode::parse(&self.currency).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "invalid currency in database: {}",
                self.currency
            ))
        })?;
        let customer_email = Email::parse(&self.customer_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            payment_intent_id: self.payment_intent_id,
            status,
            amount: Money {
                amount: self.amount,
                currency,
            },
            customer_email,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            shipping_address: self.shipping_address.0,
            items: self.items.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, payment_intent_id, status, amount, currency, \
     customer_email, customer_name, customer_phone, shipping_address, items, \
     created_at, updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the payment intent id already
    /// has an order, `RepositoryError::Database` for other failures.
    pub async fn create(&self, new: NewOrder) -> Result<Order, RepositoryError> {
        let row: OrderRow = sqlx::query_as(
            "INSERT INTO orders \
                 (payment_intent_id, status, amount, currency, customer_email, \
                  customer_name, customer_phone, shipping_address, items) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, payment_intent_id, status, amount, currency, \
                       customer_email, customer_name, customer_phone, \
                       shipping_address, items, created_at, updated_at",
        )
        .bind(&new.payment_intent_id)
        .bind(PaymentStatus::Pending.as_str())
        .bind(new.amount.amount)
        .bind(new.amount.currency.code())
        .bind(new.customer_email.as_str())
        .bind(&new.customer_name)
        .bind(&new.customer_phone)
        .bind(Json(&new.shipping_address))
        .bind(Json(&new.items))
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("payment intent already has an order".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_order()
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(self.pool)
                .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// Find the order correlated to a Stripe payment intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE payment_intent_id = $1"
        ))
        .bind(payment_intent_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// List orders newest first, with an optional status filter.
    ///
    /// Returns the page plus the total row count for the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, params: ListParams) -> Result<(Vec<Order>, i64), RepositoryError> {
        let status = params.status.map(PaymentStatus::as_str);

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(self.pool)
                .await?;

        let orders = rows
            .into_iter()
            .map(OrderRow::into_order)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((orders, total))
    }

    /// Transition an order's status, guarded by the expected current status.
    ///
    /// Returns `false` when no row matched (the status changed concurrently),
    /// letting the caller re-read instead of clobbering a newer state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transition_status(
        &self,
        order_id: OrderId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND status = $3",
        )
        .bind(to.as_str())
        .bind(order_id.as_i64())
        .bind(from.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
