// src/models/variant.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A sellable catalog variant (size/colour of a product). Read-only to the
/// checkout flow; stock is never decremented here.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Variant {
  pub id: Uuid,
  pub sku: String,
  pub slug: String,
  pub title: String,
  pub price_cents: i32,
  pub currency: String,
  pub stock_quantity: i32,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
