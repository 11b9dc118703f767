// src/web/handlers/webhook_handlers.rs

use actix_web::http::header::HeaderMap;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::providers::PROVIDER_MERCADOPAGO;
use crate::services::orders::{self, Reconciliation};
use crate::services::signature;
use crate::state::AppState;

const APPROVED: &str = "approved";

// --- Request DTOs ---

/// Legacy GET form: `?data.id=123`.
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
  #[serde(default, rename = "data.id")]
  pub data_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
  #[serde(default)]
  data: Option<WebhookData>,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
  // MercadoPago has sent both numeric and string ids over time.
  #[serde(default)]
  id: Option<JsonValue>,
}

fn payment_id_from_body(bytes: &[u8]) -> Result<String, AppError> {
  let body: WebhookBody = serde_json::from_slice(bytes)
    .map_err(|e| AppError::Validation(format!("Webhook body is not valid JSON: {}", e)))?;

  let id_value = body
    .data
    .and_then(|data| data.id)
    .ok_or_else(|| AppError::Validation("Webhook notification carried no data.id.".to_string()))?;

  match id_value {
    JsonValue::String(s) if !s.is_empty() => Ok(s),
    JsonValue::Number(n) => Ok(n.to_string()),
    _ => Err(AppError::Validation("Webhook data.id has an unusable shape.".to_string())),
  }
}

// --- Handler Implementations ---

/// POST form: body is read raw so that the payload bytes stay available
/// for signature work; only the parsed `data.id` feeds the manifest.
#[instrument(name = "handler::mp_webhook_post", skip(app_state, req, body), fields(body_len = body.len()))]
pub async fn mp_webhook_post_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let payment_id = payment_id_from_body(&body)?;
  process_notification(&app_state, req.headers(), &payment_id).await
}

#[instrument(name = "handler::mp_webhook_get", skip(app_state, req, query))]
pub async fn mp_webhook_get_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  query: web::Query<WebhookQuery>,
) -> Result<HttpResponse, AppError> {
  let payment_id = query
    .into_inner()
    .data_id
    .filter(|id| !id.is_empty())
    .ok_or_else(|| AppError::Validation("Webhook query carried no data.id.".to_string()))?;
  process_notification(&app_state, req.headers(), &payment_id).await
}

/// Shared reconciliation path for both delivery forms.
async fn process_notification(
  app_state: &web::Data<AppState>,
  headers: &HeaderMap,
  payment_id: &str,
) -> Result<HttpResponse, AppError> {
  enforce_signature(&app_state.config, headers, payment_id)?;

  // The pushed payload's status is never trusted; the provider is asked
  // for the authoritative state of this payment.
  let payment = app_state.mercadopago.get_payment(payment_id).await?;

  if payment.status != APPROVED {
    info!(payment_id, status = %payment.status, "Payment not approved; acknowledging without reconciling.");
    return Ok(HttpResponse::Ok().json(json!({"ok": true, "skipped": "not_approved"})));
  }

  let order_id = payment
    .external_reference
    .as_deref()
    .and_then(|reference| Uuid::parse_str(reference).ok())
    .ok_or_else(|| {
      warn!(payment_id, reference = ?payment.external_reference, "Payment carries no usable external reference.");
      AppError::NotFound("No order matches this payment's external reference.".to_string())
    })?;

  let order = orders::find_order(&app_state.db_pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found for payment {}.", order_id, payment_id)))?;

  if orders::is_duplicate_payment(&order, payment_id) {
    info!(%order_id, payment_id, "Duplicate webhook delivery; order already paid by this payment.");
    return Ok(HttpResponse::Ok().json(json!({"ok": true, "skipped": "duplicate_payment"})));
  }

  match orders::mark_order_paid(&app_state.db_pool, order_id, PROVIDER_MERCADOPAGO, payment_id).await? {
    Reconciliation::Updated => Ok(HttpResponse::Ok().json(json!({"ok": true}))),
    Reconciliation::DuplicatePayment => {
      Ok(HttpResponse::Ok().json(json!({"ok": true, "skipped": "duplicate_payment"})))
    }
  }
}

/// Signature policy: verification runs whenever a secret is configured.
/// A missing secret is a hard failure in production and a logged skip in
/// development, so local setups keep working while production fails
/// closed. Missing or malformed headers are a 401, before any lookup.
fn enforce_signature(config: &AppConfig, headers: &HeaderMap, payment_id: &str) -> Result<(), AppError> {
  let secret = match &config.mp_webhook_secret {
    Some(secret) => secret,
    None if config.is_production() => {
      return Err(AppError::Config(
        "MP_WEBHOOK_SECRET is not configured in production.".to_string(),
      ));
    }
    None => {
      warn!("MP_WEBHOOK_SECRET unset; skipping webhook signature verification outside production.");
      return Ok(());
    }
  };

  let header_value = |name: &str| {
    headers
      .get(name)
      .and_then(|value| value.to_str().ok())
      .map(String::from)
      .ok_or_else(|| AppError::Auth(format!("Missing {} header.", name)))
  };

  let x_signature = header_value("x-signature")?;
  let x_request_id = header_value("x-request-id")?;

  signature::verify_webhook_signature(secret, payment_id, &x_request_id, &x_signature)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn body_ids_accept_numbers_and_strings() {
    assert_eq!(payment_id_from_body(br#"{"data":{"id":555}}"#).unwrap(), "555");
    assert_eq!(payment_id_from_body(br#"{"data":{"id":"555"}}"#).unwrap(), "555");
  }

  #[test]
  fn missing_data_id_is_a_validation_error() {
    assert!(matches!(
      payment_id_from_body(br#"{"data":{}}"#),
      Err(AppError::Validation(_))
    ));
    assert!(matches!(payment_id_from_body(br#"{}"#), Err(AppError::Validation(_))));
    assert!(matches!(payment_id_from_body(b"not json"), Err(AppError::Validation(_))));
  }
}
