use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::Money;
use crate::types::{ApplicationId, Installment, InvoiceId, PaymentApplication, PaymentId};

/// one discrete allocation: this much of this payment application settled
/// this installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEvent {
    pub application_id: ApplicationId,
    pub payment_id: PaymentId,
    pub invoice_id: InvoiceId,
    pub installment_sequence: u32,
    pub installment_due_date: NaiveDate,
    pub installment_amount: Money,
    /// portion of the application consumed by this installment
    pub amount_applied: Money,
    pub application_date: NaiveDate,
}

/// snapshot-mode allocation: consume a single paid-to-date lump against the
/// installments strictly in sequence order
///
/// returns the unconsumed remainder (non-zero when the lump exceeds the
/// scheduled total)
pub fn apply_lump(installments: &mut [Installment], lump: Money) -> Money {
    let mut remaining = lump.max(Money::ZERO);
    for installment in installments.iter_mut() {
        if !remaining.is_positive() {
            break;
        }
        let applied = remaining.min(installment.pending.max(Money::ZERO));
        installment.paid += applied;
        installment.pending -= applied;
        remaining -= applied;
    }
    remaining
}

/// event-replay allocation: walk payment applications in ascending
/// application-date order, applying each FIFO across the invoice's
/// installments and emitting one event per (application, installment) pair
/// touched
///
/// installments must be ordered by sequence; applications are expected
/// invoice-scoped (the caller resolves references). replaying the same
/// history against a fresh schedule reproduces identical balances
pub fn replay(
    installments: &mut [Installment],
    applications: &[PaymentApplication],
) -> Vec<AllocationEvent> {
    let mut ordered: Vec<&PaymentApplication> =
        applications.iter().filter(|a| a.is_allocatable()).collect();
    ordered.sort_by_key(|a| a.application_date);

    let mut events = Vec::new();
    for application in ordered {
        let mut remaining = application.amount;
        for installment in installments.iter_mut() {
            if !remaining.is_positive() {
                break;
            }
            if installment.is_settled() {
                continue;
            }
            let applied = remaining.min(installment.pending);
            installment.paid += applied;
            installment.pending -= applied;
            remaining -= applied;

            debug!(
                application = %application.id,
                sequence = installment.sequence,
                applied = %applied,
                "allocated"
            );
            events.push(AllocationEvent {
                application_id: application.id,
                payment_id: application.payment_id,
                invoice_id: application.invoice_id,
                installment_sequence: installment.sequence,
                installment_due_date: installment.due_date,
                installment_amount: installment.amount,
                amount_applied: applied,
                application_date: application.application_date,
            });
        }
    }
    events
}

/// aggregate amount applied per installment sequence, from an event stream
pub fn paid_by_sequence(events: &[AllocationEvent]) -> Vec<(u32, Money)> {
    let mut totals: Vec<(u32, Money)> = Vec::new();
    for event in events {
        match totals.iter_mut().find(|(seq, _)| *seq == event.installment_sequence) {
            Some((_, total)) => *total += event.amount_applied,
            None => totals.push((event.installment_sequence, event.amount_applied)),
        }
    }
    totals.sort_by_key(|(seq, _)| *seq);
    totals
}
