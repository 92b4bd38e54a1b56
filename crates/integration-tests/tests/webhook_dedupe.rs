//! Integration tests for the webhook idempotency ledger.
//!
//! The handler checks the ledger before doing any work and records the event
//! id only after the transition (and its side effects) completed. These tests
//! drive an in-memory model of that pipeline through the delivery patterns
//! Stripe actually produces: clean deliveries, redeliveries of handled
//! events, and redeliveries after a mid-processing failure.

use std::collections::HashSet;

use harborlight_core::PaymentStatus;

/// In-memory model of one payment record plus the event ledger, mirroring
/// the handler's ordering: seen-check, transition, side effect, record.
struct Pipeline {
    ledger: HashSet<String>,
    status: PaymentStatus,
    receipts_sent: usize,
}

enum Delivery {
    /// Event acknowledged without touching the record.
    Duplicate,
    /// Event processed (or skipped as illegal/no-op) and recorded.
    Handled,
    /// Processing failed before the ledger write; no acknowledgment.
    Failed,
}

impl Pipeline {
    fn new() -> Self {
        Self {
            ledger: HashSet::new(),
            status: PaymentStatus::Pending,
            receipts_sent: 0,
        }
    }

    fn deliver(&mut self, event_id: &str, target: PaymentStatus) -> Delivery {
        self.deliver_with_fault(event_id, target, false)
    }

    /// `fail_before_record` simulates a crash between applying the
    /// transition's side effects and writing the ledger entry.
    fn deliver_with_fault(
        &mut self,
        event_id: &str,
        target: PaymentStatus,
        fail_before_record: bool,
    ) -> Delivery {
        if self.ledger.contains(event_id) {
            return Delivery::Duplicate;
        }
        if self.status != target && self.status.can_transition_to(target) {
            self.status = target;
            if target == PaymentStatus::Succeeded {
                self.receipts_sent += 1;
            }
        }
        if fail_before_record {
            return Delivery::Failed;
        }
        self.ledger.insert(event_id.to_owned());
        Delivery::Handled
    }
}

#[test]
fn test_fresh_event_transitions_and_is_recorded() {
    let mut pipeline = Pipeline::new();
    assert!(matches!(
        pipeline.deliver("evt_1", PaymentStatus::Succeeded),
        Delivery::Handled
    ));
    assert_eq!(pipeline.status, PaymentStatus::Succeeded);
    assert_eq!(pipeline.receipts_sent, 1);
}

#[test]
fn test_redelivery_of_handled_event_is_a_no_op() {
    let mut pipeline = Pipeline::new();
    pipeline.deliver("evt_1", PaymentStatus::Succeeded);

    // Stripe redelivers the same event id; the ledger short-circuits it.
    assert!(matches!(
        pipeline.deliver("evt_1", PaymentStatus::Succeeded),
        Delivery::Duplicate
    ));
    assert_eq!(pipeline.status, PaymentStatus::Succeeded);
    assert_eq!(pipeline.receipts_sent, 1);
}

#[test]
fn test_failure_before_record_leaves_event_retryable() {
    let mut pipeline = Pipeline::new();

    // First attempt dies after the side effects but before the ledger write.
    assert!(matches!(
        pipeline.deliver_with_fault("evt_1", PaymentStatus::Succeeded, true),
        Delivery::Failed
    ));
    assert!(!pipeline.ledger.contains("evt_1"));

    // Stripe retries; the event is not in the ledger, the record already
    // carries the target status, so the retry acks without a second receipt.
    assert!(matches!(
        pipeline.deliver("evt_1", PaymentStatus::Succeeded),
        Delivery::Handled
    ));
    assert_eq!(pipeline.status, PaymentStatus::Succeeded);
    assert_eq!(pipeline.receipts_sent, 1);
    assert!(pipeline.ledger.contains("evt_1"));
}

#[test]
fn test_distinct_events_advance_the_lifecycle() {
    let mut pipeline = Pipeline::new();
    pipeline.deliver("evt_1", PaymentStatus::Succeeded);
    pipeline.deliver("evt_2", PaymentStatus::Refunded);

    assert_eq!(pipeline.status, PaymentStatus::Refunded);
    assert_eq!(pipeline.ledger.len(), 2);
}

#[test]
fn test_late_duplicate_cannot_regress_a_refund() {
    let mut pipeline = Pipeline::new();
    pipeline.deliver("evt_1", PaymentStatus::Succeeded);
    pipeline.deliver("evt_2", PaymentStatus::Refunded);

    // Redelivered success after the refund: deduped, record untouched.
    assert!(matches!(
        pipeline.deliver("evt_1", PaymentStatus::Succeeded),
        Delivery::Duplicate
    ));
    assert_eq!(pipeline.status, PaymentStatus::Refunded);
    assert_eq!(pipeline.receipts_sent, 1);
}
