// tests/webhook_signature_tests.rs

use hmac::{Hmac, Mac};
use sha2::Sha256;

use storefront_checkout::errors::AppError;
use storefront_checkout::services::signature::{parse_signature_header, signed_manifest, verify_webhook_signature};

type HmacSha256 = Hmac<Sha256>;

const SECRET: &str = "whsec_test123secret456";
const TS: &str = "1712000000";

fn compute_signature(secret: &str, payment_id: &str, request_id: &str, ts: &str) -> String {
  let manifest = signed_manifest(payment_id, request_id, ts);
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
  mac.update(manifest.as_bytes());
  hex::encode(mac.finalize().into_bytes())
}

fn header_for(secret: &str, payment_id: &str, request_id: &str) -> String {
  format!("ts={},v1={}", TS, compute_signature(secret, payment_id, request_id, TS))
}

#[test]
fn test_valid_signature_is_accepted() {
  let header = header_for(SECRET, "555", "req-abc");
  assert!(verify_webhook_signature(SECRET, "555", "req-abc", &header).is_ok());
}

#[test]
fn test_signature_from_wrong_secret_is_rejected() {
  let header = header_for("wrong_secret", "555", "req-abc");
  let err = verify_webhook_signature(SECRET, "555", "req-abc", &header).unwrap_err();
  assert!(matches!(err, AppError::Auth(_)));
}

#[test]
fn test_signature_does_not_transfer_between_payments() {
  // A digest minted for payment 555 must not validate payment 556.
  let header = header_for(SECRET, "555", "req-abc");
  let err = verify_webhook_signature(SECRET, "556", "req-abc", &header).unwrap_err();
  assert!(matches!(err, AppError::Auth(_)));
}

#[test]
fn test_signature_binds_the_request_id() {
  let header = header_for(SECRET, "555", "req-abc");
  let err = verify_webhook_signature(SECRET, "555", "req-other", &header).unwrap_err();
  assert!(matches!(err, AppError::Auth(_)));
}

#[test]
fn test_tampered_timestamp_invalidates_the_digest() {
  let digest = compute_signature(SECRET, "555", "req-abc", TS);
  let header = format!("ts=1712009999,v1={}", digest);
  let err = verify_webhook_signature(SECRET, "555", "req-abc", &header).unwrap_err();
  assert!(matches!(err, AppError::Auth(_)));
}

#[test]
fn test_malformed_headers_fail_closed() {
  for raw in ["", "garbage", "ts=123", "v1=abcdef", "ts=,v1="] {
    let err = verify_webhook_signature(SECRET, "555", "req-abc", raw).unwrap_err();
    assert!(matches!(err, AppError::Auth(_)), "header {:?} must be rejected", raw);
  }
}

#[test]
fn test_manifest_shape_matches_the_provider_contract() {
  assert_eq!(signed_manifest("555", "req-abc", TS), "id:555;request-id:req-abc;ts:1712000000;");
}

#[test]
fn test_header_parser_handles_spacing_and_order() {
  let parsed = parse_signature_header("v1=deadbeef, ts=99").unwrap();
  assert_eq!(parsed.ts, "99");
  assert_eq!(parsed.v1, "deadbeef");
}
