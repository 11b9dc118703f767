// src/providers/stripe.rs

//! Thin client over Stripe's hosted Checkout Session API.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result};
use crate::providers::{IntentRequest, NextAction, PaymentIntent, PaymentMethod, PaymentProvider, PROVIDER_STRIPE};

const STRIPE_API_BASE: &str = "https://api.stripe.com";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

#[derive(Clone)]
pub struct StripeGateway {
  http: Client,
  secret_key: String,
  site_base_url: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
  id: String,
  url: Option<String>,
}

impl StripeGateway {
  pub fn new(secret_key: String, site_base_url: String) -> Result<Self> {
    let http = Client::builder()
      .use_rustls_tls()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build Stripe HTTP client: {}", e)))?;

    Ok(Self {
      http,
      secret_key,
      site_base_url,
    })
  }

  /// Creates a hosted Checkout Session for the order and returns its
  /// redirect URL. The order id rides along as `client_reference_id`.
  #[instrument(name = "stripe::create_checkout_session", skip(self, req), fields(order_id = %req.order.id))]
  async fn create_checkout_session(&self, req: &IntentRequest<'_>) -> Result<CheckoutSession> {
    let mut params: Vec<(String, String)> = vec![
      ("mode".to_string(), "payment".to_string()),
      ("client_reference_id".to_string(), req.order.id.to_string()),
      (
        "success_url".to_string(),
        format!(
          "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
          self.site_base_url.trim_end_matches('/')
        ),
      ),
      (
        "cancel_url".to_string(),
        format!("{}/checkout/cancelled", self.site_base_url.trim_end_matches('/')),
      ),
    ];
    if let Some(email) = req.customer_email {
      params.push(("customer_email".to_string(), email.to_string()));
    }

    for (i, line) in req.lines.iter().enumerate() {
      params.push((format!("line_items[{}][quantity]", i), line.quantity.to_string()));
      params.push((
        format!("line_items[{}][price_data][currency]", i),
        req.order.currency.to_lowercase(),
      ));
      params.push((
        format!("line_items[{}][price_data][unit_amount]", i),
        line.variant.price_cents.to_string(),
      ));
      params.push((
        format!("line_items[{}][price_data][product_data][name]", i),
        line.variant.title.clone(),
      ));
      // Best-effort image: a malformed URL is omitted, never a failure.
      if let Some(image_url) = line
        .variant
        .image_url
        .as_deref()
        .and_then(|raw| absolute_image_url(&self.site_base_url, raw))
      {
        params.push((
          format!("line_items[{}][price_data][product_data][images][0]", i),
          image_url,
        ));
      }
    }

    let response = self
      .http
      .post(format!("{}/v1/checkout/sessions", STRIPE_API_BASE))
      .basic_auth(&self.secret_key, None::<&str>)
      .form(&params)
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(AppError::Stripe(format!("checkout session creation failed ({}): {}", status, body)));
    }

    let session: CheckoutSession = response.json().await?;
    info!(session_id = %session.id, "Stripe checkout session created.");
    Ok(session)
  }
}

#[async_trait]
impl PaymentProvider for StripeGateway {
  fn name(&self) -> &'static str {
    PROVIDER_STRIPE
  }

  async fn create_intent(&self, req: IntentRequest<'_>) -> Result<PaymentIntent> {
    let session = self.create_checkout_session(&req).await?;
    let url = session
      .url
      .ok_or_else(|| AppError::Stripe("checkout session response carried no redirect URL".to_string()))?;

    Ok(PaymentIntent {
      provider: PROVIDER_STRIPE,
      method: PaymentMethod::Checkout,
      external_id: session.id,
      action: NextAction::Redirect { url },
    })
  }
}

/// Absolutises a catalog image path against the site base URL. Returns
/// `None` for anything that does not parse as a valid URL; callers drop
/// the image rather than failing the checkout.
pub fn absolute_image_url(site_base_url: &str, raw: &str) -> Option<String> {
  if raw.starts_with("http://") || raw.starts_with("https://") {
    return Url::parse(raw).ok().map(String::from);
  }
  let base = Url::parse(site_base_url)
    .map_err(|e| {
      warn!(site_base_url, error = %e, "Site base URL did not parse; dropping image.");
      e
    })
    .ok()?;
  base.join(raw).ok().map(String::from)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_paths_join_against_the_site_base() {
    let url = absolute_image_url("https://shop.example.com", "/images/tee-black.jpg");
    assert_eq!(url.as_deref(), Some("https://shop.example.com/images/tee-black.jpg"));
  }

  #[test]
  fn absolute_urls_pass_through() {
    let url = absolute_image_url("https://shop.example.com", "https://cdn.example.com/tee.jpg");
    assert_eq!(url.as_deref(), Some("https://cdn.example.com/tee.jpg"));
  }

  #[test]
  fn malformed_urls_are_dropped_silently() {
    assert_eq!(absolute_image_url("not a base url", "/images/tee.jpg"), None);
    assert_eq!(absolute_image_url("https://shop.example.com", "http://exa mple/bad"), None);
  }
}
