// tests/checkout_request_tests.rs

use storefront_checkout::config::CheckoutProviderMode;
use storefront_checkout::errors::AppError;
use storefront_checkout::web::handlers::checkout_handlers::{parse_checkout_body, select_provider};
use uuid::Uuid;

#[test]
fn test_strict_payload_parses_without_salvage() {
  let variant_id = Uuid::new_v4();
  let body = serde_json::json!({
    "items": [
      { "variantId": variant_id, "qty": 2 },
      { "sku": "TEE-BLK-M", "qty": 1 }
    ],
    "currency": "BRL",
    "provider": "mercadopago",
    "method": "pix",
    "email": "client@example.com"
  });

  let request = parse_checkout_body(body.to_string().as_bytes()).expect("valid body must parse");

  assert!(!request.salvaged);
  assert_eq!(request.lines.len(), 2);
  assert_eq!(request.lines[0].variant_id, Some(variant_id));
  assert_eq!(request.lines[0].quantity, 2);
  assert_eq!(request.lines[1].sku.as_deref(), Some("TEE-BLK-M"));
  assert_eq!(request.provider.as_deref(), Some("mercadopago"));
  assert_eq!(request.email.as_deref(), Some("client@example.com"));
}

#[test]
fn test_snake_case_variant_id_is_accepted() {
  let variant_id = Uuid::new_v4();
  let body = serde_json::json!({ "items": [{ "variant_id": variant_id, "qty": 1 }] });

  let request = parse_checkout_body(body.to_string().as_bytes()).unwrap();
  assert_eq!(request.lines[0].variant_id, Some(variant_id));
}

#[test]
fn test_string_qty_is_salvaged_and_flagged() {
  let body = serde_json::json!({
    "items": [{ "sku": "TEE-BLK-M", "qty": "2" }],
    "email": "client@example.com"
  });

  let request = parse_checkout_body(body.to_string().as_bytes()).expect("salvage must recover this body");

  assert!(request.salvaged);
  assert_eq!(request.lines.len(), 1);
  assert_eq!(request.lines[0].quantity, 2);
  assert_eq!(request.email.as_deref(), Some("client@example.com"));
}

#[test]
fn test_non_positive_qty_coerces_to_one() {
  let body = serde_json::json!({ "items": [{ "sku": "TEE-BLK-M", "qty": 0 }] });
  let request = parse_checkout_body(body.to_string().as_bytes()).unwrap();
  assert!(request.salvaged);
  assert_eq!(request.lines[0].quantity, 1);

  let body = serde_json::json!({ "items": [{ "sku": "TEE-BLK-M", "qty": -3 }] });
  let request = parse_checkout_body(body.to_string().as_bytes()).unwrap();
  assert_eq!(request.lines[0].quantity, 1);
}

#[test]
fn test_unusable_qty_defaults_to_one() {
  let body = serde_json::json!({ "items": [{ "sku": "TEE-BLK-M", "qty": "plenty" }] });
  let request = parse_checkout_body(body.to_string().as_bytes()).unwrap();
  assert!(request.salvaged);
  assert_eq!(request.lines[0].quantity, 1);
}

#[test]
fn test_salvage_drops_entries_without_any_identifier() {
  let body = serde_json::json!({
    "items": [
      { "qty": 4 },
      { "sku": "TEE-BLK-M", "qty": 1 }
    ]
  });

  let request = parse_checkout_body(body.to_string().as_bytes()).unwrap();
  assert!(request.salvaged);
  assert_eq!(request.lines.len(), 1);
  assert_eq!(request.lines[0].sku.as_deref(), Some("TEE-BLK-M"));
}

#[test]
fn test_empty_cart_is_rejected_not_salvaged() {
  let body = serde_json::json!({ "items": [] });
  assert!(matches!(
    parse_checkout_body(body.to_string().as_bytes()),
    Err(AppError::Validation(_))
  ));

  let body = serde_json::json!({ "items": [{ "qty": 2 }] });
  assert!(matches!(
    parse_checkout_body(body.to_string().as_bytes()),
    Err(AppError::Validation(_))
  ));
}

#[test]
fn test_non_json_body_is_rejected() {
  assert!(matches!(
    parse_checkout_body(b"definitely not json"),
    Err(AppError::Validation(_))
  ));
}

#[test]
fn test_provider_gate_forces_stripe_unless_hybrid() {
  // Without the hybrid flag the client cannot reach MercadoPago.
  assert_eq!(
    select_provider(CheckoutProviderMode::StripeOnly, Some("mercadopago")),
    "stripe"
  );
  assert_eq!(select_provider(CheckoutProviderMode::StripeOnly, None), "stripe");

  // Hybrid honours the request but still defaults to Stripe.
  assert_eq!(
    select_provider(CheckoutProviderMode::Hybrid, Some("mercadopago")),
    "mercadopago"
  );
  assert_eq!(select_provider(CheckoutProviderMode::Hybrid, Some("stripe")), "stripe");
  assert_eq!(select_provider(CheckoutProviderMode::Hybrid, None), "stripe");
  assert_eq!(select_provider(CheckoutProviderMode::Hybrid, Some("unknown")), "stripe");
}
