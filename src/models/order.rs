// src/models/order.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

/// Matches the `order_status_enum` type in schema.sql.
///
/// Statuses only move forward; the webhook flow is the single writer of the
/// `pending -> paid` transition and never touches the later states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Shipped,
  Delivered,
  Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub status: OrderStatus,
  /// Minor units (centavos).
  pub amount_total_cents: i32,
  pub currency: String,
  /// `stripe` or `mercadopago`; set once a payment intent exists.
  pub payment_provider: Option<String>,
  /// Stripe checkout session id or MercadoPago payment id.
  pub payment_external_id: Option<String>,
  /// `pix`, `card` or `checkout` (Stripe hosted session).
  pub payment_method: Option<String>,
  pub customer_email: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
