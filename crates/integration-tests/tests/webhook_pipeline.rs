//! Integration tests for the Stripe webhook pipeline.
//!
//! Exercises signature verification and event parsing together, the same
//! path a delivery takes before any database work: sign a payload the way
//! Stripe does, verify it, then pull the routing facts out of the event.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use harborlight_api::stripe::webhook::{
    EventKind, SignatureError, WebhookEvent, verify_signature_at,
};

const SECRET: &str = "whsec_integration_test_secret";

/// Sign `payload` at `timestamp` the way Stripe's webhook sender does.
fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

fn succeeded_payload(payment_intent_id: &str, amount: i64) -> Vec<u8> {
    serde_json::json!({
        "id": "evt_integration_1",
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "object": "payment_intent",
                "id": payment_intent_id,
                "amount": amount,
                "currency": "usd",
            }
        }
    })
    .to_string()
    .into_bytes()
}

// =============================================================================
// Signature + Parse Round Trips
// =============================================================================

#[test]
fn test_signed_delivery_verifies_and_parses() {
    let now = 1_770_000_000;
    let payload = succeeded_payload("pi_abc123", 2500);
    let header = sign(&payload, now, SECRET);

    verify_signature_at(&payload, &header, SECRET, now).expect("valid signature");

    let event = WebhookEvent::from_payload(&payload).expect("valid payload");
    assert_eq!(event.kind(), EventKind::PaymentIntentSucceeded);
    assert_eq!(event.payment_intent_id(), Some("pi_abc123"));
    assert_eq!(event.amount(), Some(2500));
}

#[test]
fn test_tampered_payload_fails_verification() {
    let now = 1_770_000_000;
    let payload = succeeded_payload("pi_abc123", 2500);
    let header = sign(&payload, now, SECRET);

    // Attacker bumps the amount after signing
    let tampered = succeeded_payload("pi_abc123", 1);
    let err = verify_signature_at(&tampered, &header, SECRET, now).unwrap_err();
    assert!(matches!(err, SignatureError::Mismatch));
}

#[test]
fn test_wrong_secret_fails_verification() {
    let now = 1_770_000_000;
    let payload = succeeded_payload("pi_abc123", 2500);
    let header = sign(&payload, now, "whsec_some_other_endpoint");

    let err = verify_signature_at(&payload, &header, SECRET, now).unwrap_err();
    assert!(matches!(err, SignatureError::Mismatch));
}

#[test]
fn test_stale_delivery_rejected() {
    let signed_at = 1_770_000_000;
    let payload = succeeded_payload("pi_abc123", 2500);
    let header = sign(&payload, signed_at, SECRET);

    // Replay 10 minutes later, past the 5 minute tolerance
    let err = verify_signature_at(&payload, &header, SECRET, signed_at + 600).unwrap_err();
    assert!(matches!(err, SignatureError::TimestampOutOfTolerance));
}

// =============================================================================
// Event Routing Facts
// =============================================================================

#[test]
fn test_charge_refunded_resolves_parent_intent() {
    let payload = serde_json::json!({
        "id": "evt_integration_2",
        "type": "charge.refunded",
        "data": {
            "object": {
                "object": "charge",
                "id": "ch_xyz",
                "payment_intent": "pi_abc123",
                "amount": 2500,
                "amount_refunded": 2500,
            }
        }
    })
    .to_string()
    .into_bytes();

    let event = WebhookEvent::from_payload(&payload).expect("valid payload");
    assert_eq!(event.kind(), EventKind::ChargeRefunded);
    assert_eq!(event.payment_intent_id(), Some("pi_abc123"));
    assert_eq!(event.amount_refunded(), Some(2500));
}

#[test]
fn test_unhandled_event_types_are_recognizable() {
    let payload = serde_json::json!({
        "id": "evt_integration_3",
        "type": "customer.subscription.updated",
        "data": { "object": { "object": "subscription", "id": "sub_1" } }
    })
    .to_string()
    .into_bytes();

    let event = WebhookEvent::from_payload(&payload).expect("valid payload");
    assert_eq!(
        event.kind(),
        EventKind::Other("customer.subscription.updated".to_owned())
    );
    assert_eq!(event.payment_intent_id(), None);
}
