// src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::CheckoutProviderMode;
use crate::errors::AppError;
use crate::providers::{
  IntentRequest, NextAction, PaymentMethod, PaymentProvider, PROVIDER_MERCADOPAGO, PROVIDER_STRIPE,
};
use crate::services::catalog::{self, CartLine};
use crate::services::orders;
use crate::state::AppState;
use crate::web::handlers::session::SessionEmail;

/// The storefront sells in BRL only.
const CURRENCY_BRL: &str = "BRL";

// --- Request DTOs ---

#[derive(Debug, Deserialize)]
pub struct CheckoutItemPayload {
  #[serde(default, rename = "variantId", alias = "variant_id")]
  pub variant_id: Option<Uuid>,
  #[serde(default)]
  pub sku: Option<String>,
  pub qty: i32,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutPayload {
  pub items: Vec<CheckoutItemPayload>,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub provider: Option<String>,
  #[serde(default)]
  pub method: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
}

/// A checkout submission after parsing. `salvaged` marks requests that
/// failed strict validation and went through the tolerant fallback, so the
/// two populations stay distinguishable in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
  pub lines: Vec<CartLine>,
  pub provider: Option<String>,
  pub method: Option<String>,
  pub email: Option<String>,
  pub salvaged: bool,
}

/// Strict parse first; on any shape problem, a salvage pass re-derives a
/// minimal valid request from the raw JSON rather than blocking checkout.
/// A body from which not even one line can be recovered is a 400.
pub fn parse_checkout_body(bytes: &[u8]) -> Result<CheckoutRequest, AppError> {
  match serde_json::from_slice::<CheckoutPayload>(bytes).map_err(|e| e.to_string()).and_then(validate_payload) {
    Ok(request) => Ok(request),
    Err(reason) => {
      let value: JsonValue = serde_json::from_slice(bytes)
        .map_err(|e| AppError::Validation(format!("Request body is not valid JSON: {}", e)))?;
      match salvage_checkout_request(&value) {
        Some(request) => {
          warn!(%reason, "Checkout body failed strict validation; proceeding with salvaged request.");
          Ok(request)
        }
        None => Err(AppError::Validation(
          "Cart is empty or unreadable; nothing to check out.".to_string(),
        )),
      }
    }
  }
}

fn validate_payload(payload: CheckoutPayload) -> Result<CheckoutRequest, String> {
  if payload.items.is_empty() {
    return Err("items must not be empty".to_string());
  }
  if let Some(currency) = &payload.currency {
    if currency != CURRENCY_BRL {
      return Err(format!("unsupported currency '{}'", currency));
    }
  }

  let mut lines = Vec::with_capacity(payload.items.len());
  for (index, item) in payload.items.iter().enumerate() {
    if item.variant_id.is_none() && item.sku.is_none() {
      return Err(format!("item {} has neither variantId nor sku", index));
    }
    if item.qty < 1 {
      return Err(format!("item {} has non-positive qty", index));
    }
    lines.push(CartLine {
      variant_id: item.variant_id,
      sku: item.sku.clone(),
      quantity: item.qty,
    });
  }

  Ok(CheckoutRequest {
    lines,
    provider: payload.provider,
    method: payload.method,
    email: payload.email,
    salvaged: false,
  })
}

/// Best-effort reconstruction of a checkout request from malformed input:
/// string or missing quantities coerce to a minimum of 1, entries without
/// any usable identifier are dropped, currency is forced to BRL.
pub fn salvage_checkout_request(value: &JsonValue) -> Option<CheckoutRequest> {
  let items = value.get("items")?.as_array()?;

  let mut lines = Vec::new();
  for entry in items {
    let variant_id = entry
      .get("variantId")
      .or_else(|| entry.get("variant_id"))
      .and_then(JsonValue::as_str)
      .and_then(|raw| Uuid::parse_str(raw).ok());
    let sku = entry.get("sku").and_then(JsonValue::as_str).map(String::from);
    if variant_id.is_none() && sku.is_none() {
      continue;
    }

    let quantity = match entry.get("qty") {
      Some(JsonValue::Number(n)) => n.as_i64().unwrap_or(1),
      Some(JsonValue::String(s)) => s.trim().parse::<i64>().unwrap_or(1),
      _ => 1,
    }
    .clamp(1, i64::from(i32::MAX)) as i32;

    lines.push(CartLine {
      variant_id,
      sku,
      quantity,
    });
  }

  if lines.is_empty() {
    return None;
  }

  let get_string = |key: &str| value.get(key).and_then(JsonValue::as_str).map(String::from);

  Some(CheckoutRequest {
    lines,
    provider: get_string("provider"),
    method: get_string("method"),
    email: get_string("email"),
    salvaged: true,
  })
}

/// Server-side provider gate. The client's wish only matters when the
/// hybrid flag has unlocked MercadoPago.
pub fn select_provider(mode: CheckoutProviderMode, requested: Option<&str>) -> &'static str {
  match (mode, requested) {
    (CheckoutProviderMode::Hybrid, Some(PROVIDER_MERCADOPAGO)) => PROVIDER_MERCADOPAGO,
    _ => PROVIDER_STRIPE,
  }
}

// --- Handler Implementation ---

#[instrument(name = "handler::create_checkout_session", skip(app_state, session, body), fields(body_len = body.len()))]
pub async fn create_session_handler(
  app_state: web::Data<AppState>,
  session: SessionEmail,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let request = parse_checkout_body(&body)?;
  if request.salvaged {
    info!("Processing a salvaged checkout request.");
  }

  // Resolution runs before any persistence: an unresolvable line means no
  // order row exists afterwards.
  let resolved = catalog::resolve_cart_lines(&app_state.db_pool, &request.lines).await?;

  let provider = select_provider(app_state.config.checkout_provider, request.provider.as_deref());
  let email = request.email.or(session.0);

  if provider == PROVIDER_MERCADOPAGO && email.is_none() {
    return Err(AppError::Validation(
      "Email is required for MercadoPago payments.".to_string(),
    ));
  }

  let method = match (provider, request.method.as_deref()) {
    (PROVIDER_MERCADOPAGO, Some("card")) => PaymentMethod::Card,
    (PROVIDER_MERCADOPAGO, _) => PaymentMethod::Pix,
    _ => PaymentMethod::Checkout,
  };

  let order = orders::create_pending_order(&app_state.db_pool, &resolved, CURRENCY_BRL, email.as_deref()).await?;

  let gateway: &dyn PaymentProvider = match provider {
    PROVIDER_MERCADOPAGO => app_state.mercadopago.as_ref(),
    _ => app_state.stripe.as_ref(),
  };

  let intent = gateway
    .create_intent(IntentRequest {
      order: &order,
      lines: &resolved,
      customer_email: email.as_deref(),
      method,
    })
    .await?;

  orders::stamp_payment_intent(
    &app_state.db_pool,
    order.id,
    intent.provider,
    &intent.external_id,
    intent.method.as_str(),
  )
  .await?;

  info!(
    order_id = %order.id, provider = intent.provider, method = intent.method.as_str(),
    "Checkout session created."
  );

  let response = match (&intent.action, intent.method) {
    (NextAction::PixQr { qr_code, qr_code_base64, expires_at, amount }, _) => json!({
      "provider": intent.provider,
      "method": "pix",
      "orderId": order.id,
      "paymentId": intent.external_id.clone(),
      "qrCode": qr_code,
      "qrCodeBase64": qr_code_base64,
      "expiresAt": expires_at,
      "amount": amount,
    }),
    (NextAction::Redirect { url }, PaymentMethod::Card) => json!({
      "provider": intent.provider,
      "method": "card",
      "orderId": order.id,
      "initPoint": url,
    }),
    (NextAction::Redirect { url }, _) => json!({
      "provider": intent.provider,
      "orderId": order.id,
      "url": url,
    }),
  };

  Ok(HttpResponse::Ok().json(response))
}
