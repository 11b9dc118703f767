// src/providers/mercadopago.rs

//! Thin client over the MercadoPago payments API: PIX payment intents,
//! card preferences, and the authoritative payment lookup used by the
//! webhook handler.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::providers::{IntentRequest, NextAction, PaymentIntent, PaymentMethod, PaymentProvider, PROVIDER_MERCADOPAGO};

const MP_API_BASE: &str = "https://api.mercadopago.com";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

#[derive(Clone)]
pub struct MercadoPagoGateway {
  http: Client,
  access_token: String,
  site_base_url: String,
  notification_url: String,
}

/// Authoritative payment state, fetched by id. The webhook payload's own
/// status field is never trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDetails {
  pub id: i64,
  pub status: String,
  pub external_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PixPaymentResponse {
  id: i64,
  status: String,
  date_of_expiration: Option<String>,
  point_of_interaction: Option<PointOfInteraction>,
}

#[derive(Debug, Deserialize)]
struct PointOfInteraction {
  transaction_data: Option<TransactionData>,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
  qr_code: Option<String>,
  qr_code_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
  id: String,
  init_point: String,
}

/// Converts minor units to the currency units MercadoPago expects
/// (25800 centavos -> 258.0).
pub fn amount_units(cents: i32) -> f64 {
  f64::from(cents) / 100.0
}

impl MercadoPagoGateway {
  pub fn new(access_token: String, site_base_url: String, notification_url: String) -> Result<Self> {
    let http = Client::builder()
      .use_rustls_tls()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build MercadoPago HTTP client: {}", e)))?;

    Ok(Self {
      http,
      access_token,
      site_base_url,
      notification_url,
    })
  }

  async fn post_json(&self, path: &str, idempotency_key: Option<&str>, body: &serde_json::Value) -> Result<reqwest::Response> {
    let mut request = self
      .http
      .post(format!("{}{}", MP_API_BASE, path))
      .bearer_auth(&self.access_token)
      .json(body);
    if let Some(key) = idempotency_key {
      request = request.header("X-Idempotency-Key", key);
    }
    Ok(request.send().await?)
  }

  /// Creates a PIX payment whose `external_reference` carries the local
  /// order id for webhook reconciliation. Idempotent per order.
  #[instrument(name = "mercadopago::create_pix_payment", skip(self, req), fields(order_id = %req.order.id))]
  async fn create_pix_payment(&self, req: &IntentRequest<'_>) -> Result<PixPaymentResponse> {
    let email = req
      .customer_email
      .ok_or_else(|| AppError::Validation("Email is required for MercadoPago payments.".to_string()))?;

    let body = json!({
      "transaction_amount": amount_units(req.order.amount_total_cents),
      "description": format!("Order {}", req.order.id),
      "payment_method_id": "pix",
      "external_reference": req.order.id.to_string(),
      "notification_url": self.notification_url,
      "payer": { "email": email },
    });

    let order_key = req.order.id.to_string();
    let response = self.post_json("/v1/payments", Some(&order_key), &body).await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(AppError::MercadoPago(format!("PIX payment creation failed ({}): {}", status, body)));
    }

    let payment: PixPaymentResponse = response.json().await?;
    info!(payment_id = payment.id, status = %payment.status, "MercadoPago PIX payment created.");
    Ok(payment)
  }

  /// Creates a card checkout preference and returns its redirect URL.
  #[instrument(name = "mercadopago::create_card_preference", skip(self, req), fields(order_id = %req.order.id))]
  async fn create_card_preference(&self, req: &IntentRequest<'_>) -> Result<PreferenceResponse> {
    let email = req
      .customer_email
      .ok_or_else(|| AppError::Validation("Email is required for MercadoPago payments.".to_string()))?;
    let base = self.site_base_url.trim_end_matches('/');

    let items: Vec<serde_json::Value> = req
      .lines
      .iter()
      .map(|line| {
        json!({
          "title": line.variant.title,
          "quantity": line.quantity,
          "unit_price": amount_units(line.variant.price_cents),
          "currency_id": req.order.currency,
        })
      })
      .collect();

    let body = json!({
      "items": items,
      "external_reference": req.order.id.to_string(),
      "notification_url": self.notification_url,
      "payer": { "email": email },
      "back_urls": {
        "success": format!("{}/checkout/success", base),
        "pending": format!("{}/checkout/pending", base),
        "failure": format!("{}/checkout/cancelled", base),
      },
      "auto_return": "approved",
    });

    let response = self.post_json("/checkout/preferences", None, &body).await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(AppError::MercadoPago(format!("preference creation failed ({}): {}", status, body)));
    }

    let preference: PreferenceResponse = response.json().await?;
    info!(preference_id = %preference.id, "MercadoPago card preference created.");
    Ok(preference)
  }

  /// Fetches a payment by id. The webhook handler uses this instead of the
  /// pushed payload, which defends against tampered or stale notifications.
  #[instrument(name = "mercadopago::get_payment", skip(self))]
  pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetails> {
    let response = self
      .http
      .get(format!("{}/v1/payments/{}", MP_API_BASE, payment_id))
      .bearer_auth(&self.access_token)
      .send()
      .await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Err(AppError::NotFound(format!("MercadoPago payment {} not found.", payment_id)));
    }
    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(AppError::MercadoPago(format!("payment lookup failed ({}): {}", status, body)));
    }

    Ok(response.json().await?)
  }
}

#[async_trait]
impl PaymentProvider for MercadoPagoGateway {
  fn name(&self) -> &'static str {
    PROVIDER_MERCADOPAGO
  }

  async fn create_intent(&self, req: IntentRequest<'_>) -> Result<PaymentIntent> {
    match req.method {
      PaymentMethod::Pix => {
        let payment = self.create_pix_payment(&req).await?;
        let transaction_data = payment
          .point_of_interaction
          .and_then(|poi| poi.transaction_data)
          .ok_or_else(|| AppError::MercadoPago("PIX response carried no transaction data".to_string()))?;
        let qr_code = transaction_data
          .qr_code
          .filter(|qr| !qr.is_empty())
          .ok_or_else(|| AppError::MercadoPago("PIX response carried no QR payload".to_string()))?;

        Ok(PaymentIntent {
          provider: PROVIDER_MERCADOPAGO,
          method: PaymentMethod::Pix,
          external_id: payment.id.to_string(),
          action: NextAction::PixQr {
            qr_code,
            qr_code_base64: transaction_data.qr_code_base64.unwrap_or_default(),
            expires_at: payment.date_of_expiration,
            amount: amount_units(req.order.amount_total_cents),
          },
        })
      }
      PaymentMethod::Card => {
        let preference = self.create_card_preference(&req).await?;
        Ok(PaymentIntent {
          provider: PROVIDER_MERCADOPAGO,
          method: PaymentMethod::Card,
          external_id: preference.id,
          action: NextAction::Redirect {
            url: preference.init_point,
          },
        })
      }
      PaymentMethod::Checkout => Err(AppError::Validation(
        "Hosted checkout sessions are a Stripe method.".to_string(),
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn amounts_convert_from_minor_units() {
    assert_eq!(amount_units(25800), 258.0);
    assert_eq!(amount_units(12900), 129.0);
    assert_eq!(amount_units(1), 0.01);
    assert_eq!(amount_units(0), 0.0);
  }

  #[test]
  fn pix_response_parses_nested_transaction_data() {
    let raw = serde_json::json!({
      "id": 555,
      "status": "pending",
      "date_of_expiration": "2026-08-07T12:00:00.000-03:00",
      "point_of_interaction": {
        "transaction_data": {
          "qr_code": "00020126580014br.gov.bcb.pix",
          "qr_code_base64": "aGVsbG8="
        }
      }
    });

    let parsed: PixPaymentResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(parsed.id, 555);
    let data = parsed.point_of_interaction.unwrap().transaction_data.unwrap();
    assert_eq!(data.qr_code.as_deref(), Some("00020126580014br.gov.bcb.pix"));
  }
}
