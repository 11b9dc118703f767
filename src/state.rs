// src/state.rs

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::providers::{MercadoPagoGateway, StripeGateway};

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub config: Arc<AppConfig>,
  pub stripe: Arc<StripeGateway>,
  pub mercadopago: Arc<MercadoPagoGateway>,
}
