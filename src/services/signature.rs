// src/services/signature.rs

//! MercadoPago webhook signature verification.
//!
//! The `x-signature` header carries `ts=<unix>,v1=<hex hmac>`. The HMAC is
//! computed over a manifest string reconstructed from the notification id,
//! the `x-request-id` header and the timestamp, keyed with the webhook
//! secret. Comparison is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Parsed form of the `x-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
  pub ts: String,
  pub v1: String,
}

/// Parses `ts=...,v1=...` (any order, ignoring unknown keys). Fails closed
/// on anything that does not contain both parts.
pub fn parse_signature_header(raw: &str) -> Result<SignatureHeader> {
  let mut ts = None;
  let mut v1 = None;

  for part in raw.split(',') {
    match part.trim().split_once('=') {
      Some(("ts", value)) => ts = Some(value.trim().to_string()),
      Some(("v1", value)) => v1 = Some(value.trim().to_string()),
      _ => {}
    }
  }

  match (ts, v1) {
    (Some(ts), Some(v1)) if !ts.is_empty() && !v1.is_empty() => Ok(SignatureHeader { ts, v1 }),
    _ => Err(AppError::Auth("Malformed x-signature header.".to_string())),
  }
}

/// The exact string MercadoPago signs.
pub fn signed_manifest(payment_id: &str, request_id: &str, ts: &str) -> String {
  format!("id:{};request-id:{};ts:{};", payment_id, request_id, ts)
}

/// Verifies the webhook signature against the shared secret.
///
/// Fails closed (401) on a malformed header, a non-hex digest, or a
/// mismatch. The caller is responsible for deciding whether a missing
/// secret is tolerable for the current environment.
pub fn verify_webhook_signature(secret: &str, payment_id: &str, request_id: &str, signature_header: &str) -> Result<()> {
  let parsed = parse_signature_header(signature_header)?;
  let manifest = signed_manifest(payment_id, request_id, &parsed.ts);

  let expected = hex::decode(&parsed.v1).map_err(|_| {
    warn!("x-signature v1 component is not valid hex.");
    AppError::Auth("Malformed webhook signature.".to_string())
  })?;

  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::Internal(format!("HMAC key setup failed: {}", e)))?;
  mac.update(manifest.as_bytes());

  // verify_slice is a constant-time comparison.
  mac
    .verify_slice(&expected)
    .map_err(|_| AppError::Auth("Webhook signature mismatch.".to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sign(secret: &str, manifest: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(manifest.as_bytes());
    hex::encode(mac.finalize().into_bytes())
  }

  #[test]
  fn accepts_a_correctly_signed_manifest() {
    let secret = "whsec_test123";
    let digest = sign(secret, &signed_manifest("555", "req-1", "1712000000"));
    let header = format!("ts=1712000000,v1={}", digest);

    assert!(verify_webhook_signature(secret, "555", "req-1", &header).is_ok());
  }

  #[test]
  fn rejects_a_digest_made_with_the_wrong_secret() {
    let digest = sign("wrong_secret", &signed_manifest("555", "req-1", "1712000000"));
    let header = format!("ts=1712000000,v1={}", digest);

    let err = verify_webhook_signature("whsec_test123", "555", "req-1", &header).unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
  }

  #[test]
  fn rejects_a_manifest_signed_for_another_payment() {
    let secret = "whsec_test123";
    let digest = sign(secret, &signed_manifest("555", "req-1", "1712000000"));
    let header = format!("ts=1712000000,v1={}", digest);

    let err = verify_webhook_signature(secret, "556", "req-1", &header).unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
  }

  #[test]
  fn header_parsing_tolerates_reordering_and_unknown_keys() {
    let parsed = parse_signature_header("v1=abcdef, extra=1, ts=42").unwrap();
    assert_eq!(parsed.ts, "42");
    assert_eq!(parsed.v1, "abcdef");
  }

  #[test]
  fn header_parsing_fails_closed_on_garbage() {
    assert!(parse_signature_header("garbage").is_err());
    assert!(parse_signature_header("").is_err());
    assert!(parse_signature_header("ts=42").is_err());
    assert!(parse_signature_header("v1=abc").is_err());
  }

  #[test]
  fn non_hex_digest_is_rejected() {
    let err = verify_webhook_signature("secret", "555", "req-1", "ts=42,v1=zzzz").unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
  }
}
