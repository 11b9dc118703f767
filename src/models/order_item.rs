// src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Denormalised snapshot of a purchased line, taken at checkout time.
/// Catalog edits after purchase must not change what the order shows.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub sku: Option<String>,
  pub slug: String,
  pub title: String,
  pub quantity: i32,
  pub unit_price_cents: i32,
}
