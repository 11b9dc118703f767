// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

/// Deployment environment. Only `Production` enforces webhook signature
/// verification unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
  Development,
  Production,
}

/// Server-side gate over which payment providers are reachable.
///
/// `Hybrid` unlocks MercadoPago; anything else forces Stripe regardless of
/// what the client asked for. This is a rollback safety mechanism, not a
/// business rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutProviderMode {
  StripeOnly,
  Hybrid,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  /// Public base URL of the storefront, used for redirect/back URLs and
  /// for absolutising catalog image paths.
  pub site_base_url: String,

  pub env: AppEnv,
  pub checkout_provider: CheckoutProviderMode,

  pub stripe_secret_key: String,
  pub mp_access_token: String,
  /// Optional outside production; in production its absence is a hard
  /// failure at webhook time, not at boot.
  pub mp_webhook_secret: Option<String>,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let site_base_url = get_env("SITE_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let env = match get_env("APP_ENV").unwrap_or_else(|_| "development".to_string()).as_str() {
      "production" => AppEnv::Production,
      _ => AppEnv::Development,
    };

    let checkout_provider = match get_env("CHECKOUT_PROVIDER")
      .unwrap_or_else(|_| "stripe".to_string())
      .as_str()
    {
      "hybrid" => CheckoutProviderMode::Hybrid,
      _ => CheckoutProviderMode::StripeOnly,
    };

    let stripe_secret_key = get_env("STRIPE_SECRET_KEY")?;
    let mp_access_token = get_env("MP_ACCESS_TOKEN")?;
    let mp_webhook_secret = get_env("MP_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

    tracing::info!(
      env = ?env,
      checkout_provider = ?checkout_provider,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      site_base_url,
      env,
      checkout_provider,
      stripe_secret_key,
      mp_access_token,
      mp_webhook_secret,
    })
  }

  pub fn is_production(&self) -> bool {
    self.env == AppEnv::Production
  }

  pub fn mercadopago_enabled(&self) -> bool {
    self.checkout_provider == CheckoutProviderMode::Hybrid
  }

  /// Absolute URL MercadoPago should push payment notifications to.
  pub fn webhook_notification_url(&self) -> String {
    format!("{}/api/mp/webhook", self.site_base_url.trim_end_matches('/'))
  }
}
