// src/providers/mod.rs

//! Payment provider integrations behind a uniform intent contract.
//!
//! Both providers are called after the local pending order exists, and
//! both hand back a `PaymentIntent` describing what the client should do
//! next. The asymmetry of the hosted flows (Stripe redirects, PIX renders
//! a QR code) lives in `NextAction`, not in the handler.

pub mod mercadopago;
pub mod stripe;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::Order;
use crate::services::catalog::ResolvedLine;

pub use mercadopago::MercadoPagoGateway;
pub use stripe::StripeGateway;

pub const PROVIDER_STRIPE: &str = "stripe";
pub const PROVIDER_MERCADOPAGO: &str = "mercadopago";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
  /// MercadoPago instant payment, confirmed asynchronously by webhook.
  Pix,
  /// MercadoPago card preference (hosted redirect).
  Card,
  /// Stripe hosted checkout session.
  Checkout,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Pix => "pix",
      PaymentMethod::Card => "card",
      PaymentMethod::Checkout => "checkout",
    }
  }
}

/// Everything a provider needs to create an intent for an order.
pub struct IntentRequest<'a> {
  pub order: &'a Order,
  pub lines: &'a [ResolvedLine],
  pub customer_email: Option<&'a str>,
  pub method: PaymentMethod,
}

/// Client-facing follow-up for a freshly created intent.
#[derive(Debug, Clone)]
pub enum NextAction {
  Redirect {
    url: String,
  },
  PixQr {
    qr_code: String,
    qr_code_base64: String,
    expires_at: Option<String>,
    /// Currency units (not minor units), as rendered to the payer.
    amount: f64,
  },
}

#[derive(Debug, Clone)]
pub struct PaymentIntent {
  pub provider: &'static str,
  pub method: PaymentMethod,
  /// The provider-side reference stamped onto the order for later
  /// reconciliation (Stripe session id / MercadoPago payment id).
  pub external_id: String,
  pub action: NextAction,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
  fn name(&self) -> &'static str;

  async fn create_intent(&self, req: IntentRequest<'_>) -> Result<PaymentIntent>;
}
