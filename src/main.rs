// src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::PgPool;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use storefront_checkout::config::AppConfig;
use storefront_checkout::providers::{MercadoPagoGateway, StripeGateway};
use storefront_checkout::state::AppState;
use storefront_checkout::web::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront checkout server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  // Initialize Database Pool
  let db_pool = match PgPool::connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  // Payment gateways are built once and shared; each owns its HTTP client.
  let stripe = StripeGateway::new(app_config.stripe_secret_key.clone(), app_config.site_base_url.clone())
    .unwrap_or_else(|e| panic!("Stripe gateway setup error: {}", e));
  let mercadopago = MercadoPagoGateway::new(
    app_config.mp_access_token.clone(),
    app_config.site_base_url.clone(),
    app_config.webhook_notification_url(),
  )
  .unwrap_or_else(|e| panic!("MercadoPago gateway setup error: {}", e));

  let app_state = AppState {
    db_pool,
    config: app_config.clone(),
    stripe: Arc::new(stripe),
    mercadopago: Arc::new(mercadopago),
  };

  // Configure and Start Actix Web Server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(routes::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
