// src/web/handlers/session.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};

use crate::errors::AppError;

// --- Custom Extractor for the signed-in customer's email (Placeholder) ---
// In the full product this would read the storefront session cookie. The
// checkout flow only needs the email, and only as a fallback when the body
// does not carry one, so the extractor never fails.
#[derive(Debug)]
pub struct SessionEmail(pub Option<String>);

impl FromRequest for SessionEmail {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let email = req
      .headers()
      .get("X-Session-Email")
      .and_then(|value| value.to_str().ok())
      .map(str::trim)
      .filter(|value| !value.is_empty())
      .map(String::from);

    futures_util::future::ready(Ok(SessionEmail(email)))
  }
}
