// src/services/catalog.rs

//! Resolves client-submitted cart lines against the persisted catalog.

use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::Variant;

/// A cart line as submitted by the client, after request parsing.
/// At least one of `variant_id` / `sku` is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
  pub variant_id: Option<Uuid>,
  pub sku: Option<String>,
  pub quantity: i32,
}

/// A cart line joined with its catalog row.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
  pub variant: Variant,
  pub quantity: i32,
}

impl ResolvedLine {
  pub fn line_total_cents(&self) -> i32 {
    self.variant.price_cents * self.quantity
  }
}

/// Resolves every line by variant id (preferred) or SKU. The first line
/// that matches nothing fails the whole request, carrying its index, and
/// no order is created.
#[instrument(name = "catalog::resolve_cart_lines", skip(pool, lines), fields(line_count = lines.len()))]
pub async fn resolve_cart_lines(pool: &PgPool, lines: &[CartLine]) -> Result<Vec<ResolvedLine>> {
  let mut resolved = Vec::with_capacity(lines.len());

  for (index, line) in lines.iter().enumerate() {
    let variant: Option<Variant> = match (&line.variant_id, &line.sku) {
      (Some(id), _) => {
        sqlx::query_as(
          "SELECT id, sku, slug, title, price_cents, currency, stock_quantity, image_url, created_at, updated_at \
           FROM variants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
      }
      (None, Some(sku)) => {
        sqlx::query_as(
          "SELECT id, sku, slug, title, price_cents, currency, stock_quantity, image_url, created_at, updated_at \
           FROM variants WHERE sku = $1",
        )
        .bind(sku)
        .fetch_optional(pool)
        .await?
      }
      (None, None) => None,
    };

    match variant {
      Some(variant) => resolved.push(ResolvedLine {
        variant,
        quantity: line.quantity.max(1),
      }),
      None => {
        warn!(index, variant_id = ?line.variant_id, sku = ?line.sku, "Cart line did not resolve against the catalog.");
        return Err(AppError::ItemNotFound { index });
      }
    }
  }

  Ok(resolved)
}

/// Order total in minor units.
pub fn cart_total_cents(lines: &[ResolvedLine]) -> i32 {
  lines.iter().map(ResolvedLine::line_total_cents).sum()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn resolved(price_cents: i32, quantity: i32) -> ResolvedLine {
    ResolvedLine {
      variant: Variant {
        id: Uuid::new_v4(),
        sku: "TEE-BLK-M".to_string(),
        slug: "black-tee".to_string(),
        title: "Black Tee (M)".to_string(),
        price_cents,
        currency: "BRL".to_string(),
        stock_quantity: 10,
        image_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
      },
      quantity,
    }
  }

  #[test]
  fn totals_multiply_price_by_quantity() {
    // Two units at R$129.00 come to R$258.00.
    assert_eq!(cart_total_cents(&[resolved(12900, 2)]), 25800);
  }

  #[test]
  fn totals_sum_across_lines() {
    assert_eq!(cart_total_cents(&[resolved(12900, 2), resolved(49900, 1)]), 75700);
    assert_eq!(cart_total_cents(&[]), 0);
  }
}
