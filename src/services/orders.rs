// src/services/orders.rs

//! Order persistence: creation of pending orders with their item
//! snapshots, payment-intent stamping, and webhook reconciliation.

use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Order, OrderStatus};
use crate::services::catalog::{cart_total_cents, ResolvedLine};

const ORDER_COLUMNS: &str = "id, status, amount_total_cents, currency, payment_provider, payment_external_id, \
                             payment_method, customer_email, created_at, updated_at";

/// Outcome of a webhook reconciliation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
  /// The order moved `pending -> paid` in this call.
  Updated,
  /// The order was already paid (same payment delivered twice, or a
  /// concurrent delivery won the conditional update).
  DuplicatePayment,
}

/// Creates a `pending` order plus one snapshot row per resolved line, in a
/// single transaction. Runs before any payment-provider call so that both
/// providers share identical persistence timing.
#[instrument(name = "orders::create_pending_order", skip(pool, lines), fields(line_count = lines.len()))]
pub async fn create_pending_order(
  pool: &PgPool,
  lines: &[ResolvedLine],
  currency: &str,
  customer_email: Option<&str>,
) -> Result<Order> {
  let amount_total_cents = cart_total_cents(lines);
  let order_id = Uuid::new_v4();

  let mut tx = pool.begin().await?;

  let order: Order = sqlx::query_as(&format!(
    "INSERT INTO orders (id, status, amount_total_cents, currency, customer_email) \
     VALUES ($1, 'pending', $2, $3, $4) RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(order_id)
  .bind(amount_total_cents)
  .bind(currency)
  .bind(customer_email)
  .fetch_one(&mut *tx)
  .await?;

  for line in lines {
    sqlx::query(
      "INSERT INTO order_items (id, order_id, variant_id, sku, slug, title, quantity, unit_price_cents) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(line.variant.id)
    .bind(&line.variant.sku)
    .bind(&line.variant.slug)
    .bind(&line.variant.title)
    .bind(line.quantity)
    .bind(line.variant.price_cents)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;

  info!(order_id = %order.id, amount_total_cents, "Created pending order with item snapshots.");
  Ok(order)
}

/// Records which provider intent backs this order. Called right after the
/// provider call succeeds, while the order is still `pending`.
#[instrument(name = "orders::stamp_payment_intent", skip(pool))]
pub async fn stamp_payment_intent(
  pool: &PgPool,
  order_id: Uuid,
  provider: &str,
  external_id: &str,
  method: &str,
) -> Result<()> {
  sqlx::query(
    "UPDATE orders SET payment_provider = $2, payment_external_id = $3, payment_method = $4, updated_at = now() \
     WHERE id = $1",
  )
  .bind(order_id)
  .bind(provider)
  .bind(external_id)
  .bind(method)
  .execute(pool)
  .await?;
  Ok(())
}

pub async fn find_order(pool: &PgPool, order_id: Uuid) -> Result<Option<Order>> {
  let order = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
  Ok(order)
}

/// Flips `pending -> paid` and stamps the confirming payment, guarded at
/// the storage layer: the conditional `WHERE status = 'pending'` means two
/// concurrent deliveries of the same notification cannot both win, and a
/// `paid` (or later) order is never regressed. Zero affected rows on an
/// existing order is the duplicate case, not an error.
#[instrument(name = "orders::mark_order_paid", skip(pool))]
pub async fn mark_order_paid(pool: &PgPool, order_id: Uuid, provider: &str, payment_id: &str) -> Result<Reconciliation> {
  let result = sqlx::query(
    "UPDATE orders SET status = 'paid', payment_provider = $2, payment_external_id = $3, updated_at = now() \
     WHERE id = $1 AND status = 'pending'",
  )
  .bind(order_id)
  .bind(provider)
  .bind(payment_id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    warn!(%order_id, payment_id, "Order was not pending; treating notification as a duplicate.");
    return Ok(Reconciliation::DuplicatePayment);
  }

  info!(%order_id, payment_id, "Order reconciled to paid.");
  Ok(Reconciliation::Updated)
}

/// True when this exact payment already confirmed this order. Used to
/// short-circuit before the conditional update for the common retry case.
pub fn is_duplicate_payment(order: &Order, payment_id: &str) -> bool {
  order.status == OrderStatus::Paid && order.payment_external_id.as_deref() == Some(payment_id)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn order_with(status: OrderStatus, payment_external_id: Option<&str>) -> Order {
    Order {
      id: Uuid::new_v4(),
      status,
      amount_total_cents: 25800,
      currency: "BRL".to_string(),
      payment_provider: Some("mercadopago".to_string()),
      payment_external_id: payment_external_id.map(String::from),
      payment_method: Some("pix".to_string()),
      customer_email: Some("client@example.com".to_string()),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn duplicate_requires_paid_status_and_matching_payment() {
    let paid = order_with(OrderStatus::Paid, Some("555"));
    assert!(is_duplicate_payment(&paid, "555"));
  }

  #[test]
  fn pending_order_is_never_a_duplicate() {
    let pending = order_with(OrderStatus::Pending, Some("555"));
    assert!(!is_duplicate_payment(&pending, "555"));
  }

  #[test]
  fn different_payment_id_is_not_a_duplicate() {
    let paid = order_with(OrderStatus::Paid, Some("555"));
    assert!(!is_duplicate_payment(&paid, "556"));
  }
}
