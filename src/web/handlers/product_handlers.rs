// src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Variant;
use crate::state::AppState;

const VARIANT_COLUMNS: &str = "id, sku, slug, title, price_cents, currency, stock_quantity, image_url, created_at, updated_at";

#[instrument(name = "handler::list_variants", skip(app_state))]
pub async fn list_variants_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let variants: Vec<Variant> = sqlx::query_as(&format!(
    "SELECT {} FROM variants ORDER BY title ASC",
    VARIANT_COLUMNS
  ))
  .fetch_all(&app_state.db_pool)
  .await
  .map_err(|e| {
    error!("Failed to fetch variants from database: {}", e);
    AppError::Sqlx(e)
  })?;

  info!("Successfully fetched {} catalog variants.", variants.len());

  Ok(HttpResponse::Ok().json(serde_json::json!({ "products": variants })))
}

#[instrument(name = "handler::get_variant", skip(app_state, path), fields(variant_id = %path.as_ref()))]
pub async fn get_variant_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let variant_id = path.into_inner();

  let variant: Option<Variant> = sqlx::query_as(&format!("SELECT {} FROM variants WHERE id = $1", VARIANT_COLUMNS))
    .bind(variant_id)
    .fetch_optional(&app_state.db_pool)
    .await?;

  match variant {
    Some(variant) => Ok(HttpResponse::Ok().json(serde_json::json!({ "product": variant }))),
    None => {
      warn!("Variant with ID {} not found.", variant_id);
      Err(AppError::NotFound(format!("Variant with ID {} not found.", variant_id)))
    }
  }
}
