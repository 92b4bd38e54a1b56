//! Stripe webhook signature verification and event decoding.
//!
//! Stripe signs each webhook delivery with an HMAC-SHA256 over
//! `"{timestamp}.{payload}"` keyed by the endpoint secret, carried in the
//! `stripe-signature` header as `t=<unix>,v1=<hex>[,v1=...]`. Verification
//! enforces a timestamp tolerance against replay and compares digests in
//! constant time.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Replay tolerance for the signed timestamp (matches Stripe's SDK default).
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Errors produced by webhook signature verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Header is missing the `t=` element or it is not an integer.
    #[error("signature header missing timestamp")]
    MissingTimestamp,

    /// Header is missing every `v1=` element.
    #[error("signature header missing v1 signature")]
    MissingSignature,

    /// Signed timestamp outside the replay tolerance window.
    #[error("signature timestamp outside tolerance")]
    TimestampOutOfTolerance,

    /// No `v1` digest matched the payload.
    #[error("signature does not match payload")]
    Mismatch,
}

/// Verify a `stripe-signature` header against the raw request body.
///
/// # Errors
///
/// Returns a [`SignatureError`] describing which check failed. All failures
/// map to HTTP 400 at the route layer.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    verify_signature_at(payload, signature_header, secret, chrono::Utc::now().timestamp())
}

/// [`verify_signature`] with an explicit clock, for testability.
///
/// # Errors
///
/// See [`verify_signature`].
pub fn verify_signature_at(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            // Stripe sends one v1 per active endpoint secret during rotation.
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if candidates.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    for candidate in candidates {
        let Ok(digest) = hex::decode(candidate) else {
            continue;
        };

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::Mismatch)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        // verify_slice is constant-time
        if mac.verify_slice(&digest).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::Mismatch)
}

/// The webhook event kinds this service acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    PaymentIntentCanceled,
    ChargeRefunded,
    /// Anything else: acknowledged and ignored.
    Other(String),
}

impl EventKind {
    fn from_type(event_type: &str) -> Self {
        match event_type {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            "payment_intent.canceled" => Self::PaymentIntentCanceled,
            "charge.refunded" => Self::ChargeRefunded,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// A decoded webhook event.
///
/// `data.object` is kept as raw JSON because its shape varies by event type
/// (a `PaymentIntent` for `payment_intent.*`, a `Charge` for `charge.*`);
/// the accessors below pull out the few fields the handler needs.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event id (`evt_...`), used for idempotency.
    pub id: String,
    /// Event type string, e.g. `payment_intent.succeeded`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: EventData,
}

/// The `data` envelope of a webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The API object the event describes.
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Decode an event from the verified raw body.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error for malformed JSON.
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// The classified event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }

    /// The payment intent id this event refers to.
    ///
    /// For `payment_intent.*` events this is the object's own id; for
    /// `charge.*` events it is the charge's `payment_intent` reference.
    #[must_use]
    pub fn payment_intent_id(&self) -> Option<&str> {
        let object = &self.data.object;
        match object.get("object").and_then(serde_json::Value::as_str) {
            Some("payment_intent") => object.get("id").and_then(serde_json::Value::as_str),
            Some("charge") => object
                .get("payment_intent")
                .and_then(serde_json::Value::as_str),
            _ => None,
        }
    }

    /// The object's `amount` field in minor units.
    #[must_use]
    pub fn amount(&self) -> Option<i64> {
        self.data
            .object
            .get("amount")
            .and_then(serde_json::Value::as_i64)
    }

    /// The charge's `amount_refunded` field in minor units.
    #[must_use]
    pub fn amount_refunded(&self) -> Option<i64> {
        self.data
            .object
            .get("amount_refunded")
            .and_then(serde_json::Value::as_i64)
    }

    /// The charge's `refunded` flag, `true` once fully refunded.
    #[must_use]
    pub fn refunded(&self) -> Option<bool> {
        self.data
            .object
            .get("refunded")
            .and_then(serde_json::Value::as_bool)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn header(payload: &[u8], secret: &str, timestamp: i64) -> String {
        format!("t={timestamp},v1={}", sign(payload, secret, timestamp))
    }

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let now = 1_700_000_000;
        let header = header(payload, SECRET, now);

        assert_eq!(verify_signature_at(payload, &header, SECRET, now), Ok(()));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let now = 1_700_000_000;
        let header = header(payload, "whsec_other_secret", now);

        assert_eq!(
            verify_signature_at(payload, &header, SECRET, now),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_modified_payload_rejected() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let tampered = br#"{"type":"payment_intent.succeeded","hacked":true}"#;
        let now = 1_700_000_000;
        let header = header(payload, SECRET, now);

        assert_eq!(
            verify_signature_at(tampered, &header, SECRET, now),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_old_timestamp_rejected() {
        let payload = br#"{}"#;
        let now = 1_700_000_000;
        // 10 minutes old - beyond the 5 minute tolerance
        let header = header(payload, SECRET, now - 600);

        assert_eq!(
            verify_signature_at(payload, &header, SECRET, now),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let payload = br#"{}"#;
        let now = 1_700_000_000;
        let header = header(payload, SECRET, now + 600);

        assert_eq!(
            verify_signature_at(payload, &header, SECRET, now),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn test_timestamp_within_tolerance_accepted() {
        let payload = br#"{}"#;
        let now = 1_700_000_000;
        let header = header(payload, SECRET, now - 250);

        assert_eq!(verify_signature_at(payload, &header, SECRET, now), Ok(()));
    }

    #[test]
    fn test_missing_timestamp() {
        let payload = br#"{}"#;
        let sig = sign(payload, SECRET, 1_700_000_000);

        assert_eq!(
            verify_signature_at(payload, &format!("v1={sig}"), SECRET, 1_700_000_000),
            Err(SignatureError::MissingTimestamp)
        );
    }

    #[test]
    fn test_missing_signature() {
        assert_eq!(
            verify_signature_at(br"{}", "t=1700000000", SECRET, 1_700_000_000),
            Err(SignatureError::MissingSignature)
        );
    }

    #[test]
    fn test_second_v1_candidate_accepted() {
        // During secret rotation Stripe signs with both secrets.
        let payload = br#"{}"#;
        let now = 1_700_000_000;
        let stale = sign(payload, "whsec_retired", now);
        let good = sign(payload, SECRET, now);
        let header = format!("t={now},v1={stale},v1={good}");

        assert_eq!(verify_signature_at(payload, &header, SECRET, now), Ok(()));
    }

    #[test]
    fn test_event_kind_classification() {
        let event = WebhookEvent {
            id: "evt_1".to_string(),
            event_type: "payment_intent.succeeded".to_string(),
            data: EventData {
                object: serde_json::json!({}),
            },
        };
        assert_eq!(event.kind(), EventKind::PaymentIntentSucceeded);

        let event = WebhookEvent {
            event_type: "customer.created".to_string(),
            ..event
        };
        assert_eq!(
            event.kind(),
            EventKind::Other("customer.created".to_string())
        );
    }

    #[test]
    fn test_payment_intent_event_accessors() {
        let payload = br#"{
            "id": "evt_1NG8Du2eZvKYlo2CUI79vXWy",
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_3MtwBwLkdIwHu7ix28a3tqPa",
                    "object": "payment_intent",
                    "amount": 2500,
                    "currency": "usd",
                    "status": "succeeded"
                }
            }
        }"#;

        let event = WebhookEvent::from_payload(payload).unwrap();
        assert_eq!(event.id, "evt_1NG8Du2eZvKYlo2CUI79vXWy");
        assert_eq!(event.kind(), EventKind::PaymentIntentSucceeded);
        assert_eq!(
            event.payment_intent_id(),
            Some("pi_3MtwBwLkdIwHu7ix28a3tqPa")
        );
        assert_eq!(event.amount(), Some(2500));
    }

    #[test]
    fn test_charge_refunded_event_accessors() {
        let payload = br#"{
            "id": "evt_2",
            "type": "charge.refunded",
            "data": {
                "object": {
                    "id": "ch_3MtwBwLkdIwHu7ix0snN0B15",
                    "object": "charge",
                    "payment_intent": "pi_3MtwBwLkdIwHu7ix28a3tqPa",
                    "amount": 2500,
                    "amount_refunded": 2500,
                    "refunded": true
                }
            }
        }"#;

        let event = WebhookEvent::from_payload(payload).unwrap();
        assert_eq!(event.kind(), EventKind::ChargeRefunded);
        assert_eq!(
            event.payment_intent_id(),
            Some("pi_3MtwBwLkdIwHu7ix28a3tqPa")
        );
        assert_eq!(event.amount_refunded(), Some(2500));
        assert_eq!(event.refunded(), Some(true));
    }

    #[test]
    fn test_partial_refund_flag_stays_false() {
        let payload = br#"{
            "id": "evt_3",
            "type": "charge.refunded",
            "data": {
                "object": {
                    "id": "ch_1",
                    "object": "charge",
                    "payment_intent": "pi_1",
                    "amount": 2500,
                    "amount_refunded": 500,
                    "refunded": false
                }
            }
        }"#;

        let event = WebhookEvent::from_payload(payload).unwrap();
        assert_eq!(event.amount_refunded(), Some(500));
        assert_eq!(event.refunded(), Some(false));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        assert!(WebhookEvent::from_payload(b"not json").is_err());
    }
}
