// src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::orders;
use crate::state::AppState;

/// Order status lookup for post-checkout polling (the PIX flow confirms
/// asynchronously, so the storefront polls this until the webhook lands).
#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();

  let order = orders::find_order(&app_state.db_pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", order_id)))?;

  Ok(HttpResponse::Ok().json(json!({
    "orderId": order.id,
    "status": order.status,
    "provider": order.payment_provider,
    "paymentId": order.payment_external_id,
  })))
}
