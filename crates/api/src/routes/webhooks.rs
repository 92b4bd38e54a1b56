//! Stripe webhook receiver.
//!
//! The single source of truth for payment outcomes. Every request is
//! HMAC-verified against the endpoint secret before the body is parsed.
//! Events are deduplicated by Stripe event id, and status updates go through
//! the guarded lifecycle transition in the repositories, so redelivered or
//! out-of-order events cannot corrupt a record.
//!
//! The ledger entry is written only after the transition has been applied.
//! If processing fails mid-way the event is never recorded, Stripe retries,
//! and the redelivery gets a clean second attempt instead of hitting an
//! already-claimed event id.
//!
//! Unrecognized events, unknown payment intents, amount mismatches, and
//! partial refunds are acknowledged with 200 after logging; returning an
//! error would only make Stripe redeliver an event we will never act on.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{info, instrument, warn};

use harborlight_core::PaymentStatus;

use crate::db::donations::DonationRepository;
use crate::db::orders::OrderRepository;
use crate::db::stripe_events::StripeEventRepository;
use crate::error::AppError;
use crate::state::AppState;
use crate::stripe::webhook::{self, EventKind, WebhookEvent};

/// `POST /api/webhooks/stripe`
#[instrument(skip_all)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing stripe-signature header".into()))?;

    webhook::verify_signature(
        &body,
        signature,
        state.config().stripe.webhook_secret.expose_secret(),
    )
    .map_err(|e| {
        warn!(error = %e, "webhook signature verification failed");
        AppError::BadRequest("invalid webhook signature".into())
    })?;

    let event = WebhookEvent::from_payload(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed webhook payload: {e}")))?;

    let events = StripeEventRepository::new(state.pool());
    if events.seen(&event.id).await? {
        info!(event_id = %event.id, "duplicate webhook event, already processed");
        return Ok(ack());
    }

    let Some(target) = target_status(&event.kind()) else {
        info!(event_id = %event.id, event_type = %event.event_type, "ignoring unhandled event type");
        events.record(&event.id, &event.event_type).await?;
        return Ok(ack());
    };

    let Some(payment_intent_id) = event.payment_intent_id().map(str::to_owned) else {
        warn!(
            event_id = %event.id,
            event_type = %event.event_type,
            "event carries no payment intent id"
        );
        events.record(&event.id, &event.event_type).await?;
        return Ok(ack());
    };

    apply_transition(&state, &event, &payment_intent_id, target).await?;

    // Recorded last: a failure anywhere above leaves the event unclaimed so
    // Stripe's retry can reprocess it.
    events.record(&event.id, &event.event_type).await?;
    Ok(ack())
}

fn ack() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "received": true })))
}

/// Map an event kind to the lifecycle status it drives, if any.
fn target_status(kind: &EventKind) -> Option<PaymentStatus> {
    match kind {
        EventKind::PaymentIntentSucceeded => Some(PaymentStatus::Succeeded),
        EventKind::PaymentIntentFailed => Some(PaymentStatus::Failed),
        EventKind::PaymentIntentCanceled => Some(PaymentStatus::Canceled),
        EventKind::ChargeRefunded => Some(PaymentStatus::Refunded),
        EventKind::Other(_) => None,
    }
}

/// What to do with a record given its current status and the event's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionDecision {
    /// Run the guarded update and any side effects.
    Apply,
    /// The record already carries the target status; ack without touching it.
    AlreadyApplied,
    /// The lifecycle forbids this move; log and ack.
    Illegal,
}

fn decide_transition(current: PaymentStatus, target: PaymentStatus) -> TransitionDecision {
    if current == target {
        TransitionDecision::AlreadyApplied
    } else if current.can_transition_to(target) {
        TransitionDecision::Apply
    } else {
        TransitionDecision::Illegal
    }
}

/// Whether the event is safe to apply against a record charged `expected`.
///
/// Refunds only count once the charge is fully refunded: Stripe sends
/// `charge.refunded` for partial refunds too, and those must not flip the
/// record. Other events are checked against the original charge amount.
fn amount_guard(event: &WebhookEvent, target: PaymentStatus, expected: i64) -> bool {
    match target {
        PaymentStatus::Refunded => refund_is_full(event, expected),
        _ => amounts_match(event, expected),
    }
}

fn refund_is_full(event: &WebhookEvent, expected: i64) -> bool {
    event.refunded() == Some(true)
        || event.amount_refunded().is_some_and(|got| got >= expected)
}

fn amounts_match(event: &WebhookEvent, expected: i64) -> bool {
    // Events that omit the amount (shouldn't happen for payment_intents) are
    // treated as matching rather than stalling the record forever.
    event.amount().is_none_or(|got| got == expected)
}

/// Find the order or donation behind the payment intent and move its status.
async fn apply_transition(
    state: &AppState,
    event: &WebhookEvent,
    payment_intent_id: &str,
    target: PaymentStatus,
) -> Result<(), AppError> {
    let orders = OrderRepository::new(state.pool());
    if let Some(order) = orders.find_by_payment_intent(payment_intent_id).await? {
        if !amount_guard(event, target, order.amount.amount) {
            warn!(
                order_id = %order.id,
                expected = order.amount.amount,
                received_amount = ?event.amount(),
                received_refunded = ?event.amount_refunded(),
                to = target.as_str(),
                "webhook amount guard failed for order, leaving status untouched"
            );
            return Ok(());
        }
        match decide_transition(order.status, target) {
            TransitionDecision::AlreadyApplied => {
                info!(
                    order_id = %order.id,
                    status = target.as_str(),
                    "order already in target status"
                );
                return Ok(());
            }
            TransitionDecision::Illegal => {
                warn!(
                    order_id = %order.id,
                    from = order.status.as_str(),
                    to = target.as_str(),
                    "illegal order status transition, ignoring event"
                );
                return Ok(());
            }
            TransitionDecision::Apply => {}
        }
        let updated = orders.transition_status(order.id, order.status, target).await?;
        info!(
            order_id = %order.id,
            from = order.status.as_str(),
            to = target.as_str(),
            updated,
            "order status transition"
        );
        if updated && target == PaymentStatus::Succeeded {
            send_order_receipt(state, order.id).await;
        }
        return Ok(());
    }

    let donations = DonationRepository::new(state.pool());
    if let Some(donation) = donations.find_by_payment_intent(payment_intent_id).await? {
        if !amount_guard(event, target, donation.amount.amount) {
            warn!(
                donation_id = %donation.id,
                expected = donation.amount.amount,
                received_amount = ?event.amount(),
                received_refunded = ?event.amount_refunded(),
                to = target.as_str(),
                "webhook amount guard failed for donation, leaving status untouched"
            );
            return Ok(());
        }
        match decide_transition(donation.status, target) {
            TransitionDecision::AlreadyApplied => {
                info!(
                    donation_id = %donation.id,
                    status = target.as_str(),
                    "donation already in target status"
                );
                return Ok(());
            }
            TransitionDecision::Illegal => {
                warn!(
                    donation_id = %donation.id,
                    from = donation.status.as_str(),
                    to = target.as_str(),
                    "illegal donation status transition, ignoring event"
                );
                return Ok(());
            }
            TransitionDecision::Apply => {}
        }
        let updated = donations
            .transition_status(donation.id, donation.status, target)
            .await?;
        info!(
            donation_id = %donation.id,
            from = donation.status.as_str(),
            to = target.as_str(),
            updated,
            "donation status transition"
        );
        if updated && target == PaymentStatus::Succeeded {
            send_donation_receipt(state, donation.id).await;
        }
        return Ok(());
    }

    warn!(
        event_id = %event.id,
        payment_intent_id,
        "no order or donation for payment intent"
    );
    Ok(())
}

/// Fire the order receipt email without blocking the webhook response.
async fn send_order_receipt(state: &AppState, order_id: harborlight_core::OrderId) {
    let Some(receipts) = state.receipts().cloned() else {
        return;
    };
    let state = state.clone();
    tokio::spawn(async move {
        let order = match OrderRepository::new(state.pool()).get_by_id(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => return,
            Err(e) => {
                warn!(%order_id, error = %e, "failed to load order for receipt");
                return;
            }
        };
        if let Err(e) = receipts.send_order_receipt(&order).await {
            warn!(%order_id, error = %e, "failed to send order receipt email");
        }
    });
}

/// Fire the donation receipt email without blocking the webhook response.
async fn send_donation_receipt(state: &AppState, donation_id: harborlight_core::DonationId) {
    let Some(receipts) = state.receipts().cloned() else {
        return;
    };
    let state = state.clone();
    tokio::spawn(async move {
        let donation = match DonationRepository::new(state.pool())
            .get_by_id(donation_id)
            .await
        {
            Ok(Some(donation)) => donation,
            Ok(None) => return,
            Err(e) => {
                warn!(%donation_id, error = %e, "failed to load donation for receipt");
                return;
            }
        };
        if let Err(e) = receipts.send_donation_receipt(&donation).await {
            warn!(%donation_id, error = %e, "failed to send donation receipt email");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(json: &str) -> WebhookEvent {
        WebhookEvent::from_payload(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_target_status_mapping() {
        assert_eq!(
            target_status(&EventKind::PaymentIntentSucceeded),
            Some(PaymentStatus::Succeeded)
        );
        assert_eq!(
            target_status(&EventKind::PaymentIntentFailed),
            Some(PaymentStatus::Failed)
        );
        assert_eq!(
            target_status(&EventKind::PaymentIntentCanceled),
            Some(PaymentStatus::Canceled)
        );
        assert_eq!(
            target_status(&EventKind::ChargeRefunded),
            Some(PaymentStatus::Refunded)
        );
        assert_eq!(target_status(&EventKind::Other("invoice.paid".into())), None);
    }

    #[test]
    fn test_decide_transition() {
        assert_eq!(
            decide_transition(PaymentStatus::Pending, PaymentStatus::Succeeded),
            TransitionDecision::Apply
        );
        assert_eq!(
            decide_transition(PaymentStatus::Succeeded, PaymentStatus::Succeeded),
            TransitionDecision::AlreadyApplied
        );
        assert_eq!(
            decide_transition(PaymentStatus::Refunded, PaymentStatus::Succeeded),
            TransitionDecision::Illegal
        );
        assert_eq!(
            decide_transition(PaymentStatus::Failed, PaymentStatus::Succeeded),
            TransitionDecision::Apply
        );
    }

    #[test]
    fn test_amounts_match_tolerates_missing_amount() {
        let event = event(
            r#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"object":"payment_intent","id":"pi_1"}}}"#,
        );
        assert!(amounts_match(&event, 2500));
    }

    #[test]
    fn test_amounts_match_rejects_differing_amount() {
        let event = event(
            r#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"object":"payment_intent","id":"pi_1","amount":100}}}"#,
        );
        assert!(!amounts_match(&event, 2500));
        assert!(amounts_match(&event, 100));
    }

    #[test]
    fn test_partial_refund_does_not_pass_guard() {
        let event = event(
            r#"{"id":"evt_1","type":"charge.refunded","data":{"object":{"object":"charge","id":"ch_1","payment_intent":"pi_1","amount":2500,"amount_refunded":500,"refunded":false}}}"#,
        );
        assert!(!refund_is_full(&event, 2500));
        assert!(!amount_guard(&event, PaymentStatus::Refunded, 2500));
    }

    #[test]
    fn test_full_refund_passes_guard() {
        let by_amount = event(
            r#"{"id":"evt_1","type":"charge.refunded","data":{"object":{"object":"charge","id":"ch_1","payment_intent":"pi_1","amount":2500,"amount_refunded":2500}}}"#,
        );
        assert!(amount_guard(&by_amount, PaymentStatus::Refunded, 2500));

        let by_flag = event(
            r#"{"id":"evt_2","type":"charge.refunded","data":{"object":{"object":"charge","id":"ch_1","payment_intent":"pi_1","amount":2500,"refunded":true}}}"#,
        );
        assert!(amount_guard(&by_flag, PaymentStatus::Refunded, 2500));
    }

    #[test]
    fn test_refund_guard_requires_evidence() {
        // A charge.refunded with neither field must not flip the record.
        let bare = event(
            r#"{"id":"evt_1","type":"charge.refunded","data":{"object":{"object":"charge","id":"ch_1","payment_intent":"pi_1"}}}"#,
        );
        assert!(!amount_guard(&bare, PaymentStatus::Refunded, 2500));
    }

    #[test]
    fn test_amount_guard_applies_to_all_intent_outcomes() {
        let mismatched = event(
            r#"{"id":"evt_1","type":"payment_intent.payment_failed","data":{"object":{"object":"payment_intent","id":"pi_1","amount":999}}}"#,
        );
        for target in [
            PaymentStatus::Succeeded,
            PaymentStatus::Failed,
            PaymentStatus::Canceled,
        ] {
            assert!(!amount_guard(&mismatched, target, 2500));
            assert!(amount_guard(&mismatched, target, 999));
        }
    }
}
