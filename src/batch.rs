use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allocation::{self, AllocationEvent};
use crate::commission::{
    CommissionEngine, CommissionLedgerRow, InvoiceAttribution, ReportingWindow, RuleTable,
};
use crate::decimal::Money;
use crate::errors::Result;
use crate::schedule::InstallmentSchedule;
use crate::status::StatusClassifier;
use crate::types::{
    Installment, InstallmentStatus, Invoice, InvoiceId, MaturityTag, PaymentApplication, PaymentId,
};

/// counters from a schedule-regeneration run, matching the legacy batch
/// summary line for line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleRunSummary {
    pub invoices_read: u32,
    pub invoices_omitted: u32,
    pub invoices_processed: u32,
    pub installments_generated: u32,
    pub paid: u32,
    pub partial: u32,
    pub pending: u32,
    pub overdue: u32,
    pub upcoming: u32,
    pub date_errors: u32,
}

/// complete replacement installment sets for a batch of invoices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRun {
    pub schedules: Vec<InstallmentSchedule>,
    pub summary: ScheduleRunSummary,
}

/// regenerate every invoice's installment set from scratch
///
/// each invoice's collected-to-date snapshot is consumed FIFO across its
/// fresh installments, then statuses and maturity tags are assigned with
/// the generation-time tolerance. ineligible invoices are omitted whole and
/// counted; one invoice's bad data never disturbs another's schedule.
/// callers swap the returned sets in atomically, replacing any stored ones
pub fn regenerate_schedules(invoices: &[Invoice], time: &SafeTimeProvider) -> ScheduleRun {
    let today = time.now().date_naive();
    let classifier = StatusClassifier::generation();
    let mut summary = ScheduleRunSummary::default();
    let mut schedules = Vec::new();

    info!(invoices = invoices.len(), %today, "regenerating installment schedules");
    for invoice in invoices {
        summary.invoices_read += 1;
        let mut schedule = match InstallmentSchedule::generate(invoice) {
            Ok(schedule) => schedule,
            Err(err) => {
                warn!(invoice = %invoice.number, %err, "invoice omitted from scheduling");
                summary.invoices_omitted += 1;
                continue;
            }
        };
        summary.invoices_processed += 1;
        summary.date_errors += schedule.date_errors;

        let leftover =
            allocation::apply_lump(&mut schedule.installments, invoice.collected_total);
        if leftover.is_positive() {
            warn!(invoice = %invoice.number, %leftover, "collected total exceeds scheduled total");
        }

        for installment in &mut schedule.installments {
            classifier.apply(installment, today);
            summary.installments_generated += 1;
            match installment.status {
                InstallmentStatus::Paid => summary.paid += 1,
                InstallmentStatus::Partial => summary.partial += 1,
                InstallmentStatus::Pending => summary.pending += 1,
            }
            match installment.maturity {
                MaturityTag::Overdue { .. } => summary.overdue += 1,
                MaturityTag::Upcoming => summary.upcoming += 1,
            }
        }
        schedules.push(schedule);
    }

    info!(
        processed = summary.invoices_processed,
        omitted = summary.invoices_omitted,
        installments = summary.installments_generated,
        "schedule regeneration finished"
    );
    ScheduleRun { schedules, summary }
}

/// counters from a commission-report run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommissionRunSummary {
    pub applications_read: u32,
    /// invoice reference did not resolve against the feed
    pub applications_dangling: u32,
    /// invoice resolved but could not be scheduled
    pub applications_unschedulable: u32,
    pub applications_non_positive: u32,
    pub invoices_replayed: u32,
    pub rows_emitted: u32,
    pub unmatched_tiers: u32,
}

/// commission ledger for a reporting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionReport {
    pub rows: Vec<CommissionLedgerRow>,
    pub summary: CommissionRunSummary,
}

impl CommissionReport {
    pub fn commission_total(&self) -> Money {
        self.rows
            .iter()
            .map(|r| r.commission)
            .fold(Money::ZERO, |acc, x| acc + x)
    }
}

/// compute the commission ledger for a reporting window
///
/// the full application history of every involved invoice is replayed so
/// that in-window payments land on the installments they actually settled;
/// only events whose application date falls inside the window, and whose
/// payment is commissionable when a commissionable set is given, emit rows.
/// applications with a dangling invoice reference, an unschedulable
/// invoice, or a non-positive amount are skipped and counted, never fatal.
/// an empty rule table is the one fatal condition here
pub fn run_commission_report(
    invoices: &[Invoice],
    applications: &[PaymentApplication],
    rules: RuleTable,
    window: ReportingWindow,
    commissionable_payments: Option<&HashSet<PaymentId>>,
) -> Result<CommissionReport> {
    let engine = CommissionEngine::new(rules, window);
    let mut summary = CommissionRunSummary::default();

    let mut by_invoice: HashMap<InvoiceId, Vec<PaymentApplication>> = HashMap::new();
    let known: HashSet<InvoiceId> = invoices.iter().map(|i| i.id).collect();
    for application in applications {
        summary.applications_read += 1;
        if !known.contains(&application.invoice_id) {
            warn!(application = %application.id, "application references unknown invoice, skipped");
            summary.applications_dangling += 1;
            continue;
        }
        if !application.is_allocatable() {
            summary.applications_non_positive += 1;
            continue;
        }
        by_invoice
            .entry(application.invoice_id)
            .or_default()
            .push(application.clone());
    }

    let mut rows = Vec::new();
    for invoice in invoices {
        let Some(history) = by_invoice.get(&invoice.id) else {
            continue;
        };
        let mut schedule = match InstallmentSchedule::generate(invoice) {
            Ok(schedule) => schedule,
            Err(err) => {
                warn!(invoice = %invoice.number, %err, "invoice not schedulable, its applications skipped");
                summary.applications_unschedulable += history.len() as u32;
                continue;
            }
        };
        summary.invoices_replayed += 1;

        let events = allocation::replay(&mut schedule.installments, history);
        let attribution = InvoiceAttribution {
            invoice_id: invoice.id,
            invoice_number: invoice.number.clone(),
            client_id: invoice.client_id,
            salesperson_id: invoice.salesperson_id,
        };
        for event in &events {
            if !payment_commissionable(event, commissionable_payments) {
                continue;
            }
            if let Some(row) = engine.compute(event, &attribution) {
                if !row.rule_matched {
                    summary.unmatched_tiers += 1;
                }
                summary.rows_emitted += 1;
                rows.push(row);
            }
        }
    }

    info!(
        rows = summary.rows_emitted,
        dangling = summary.applications_dangling,
        unmatched = summary.unmatched_tiers,
        "commission report finished"
    );
    Ok(CommissionReport { rows, summary })
}

fn payment_commissionable(
    event: &AllocationEvent,
    commissionable: Option<&HashSet<PaymentId>>,
) -> bool {
    commissionable.map_or(true, |set| set.contains(&event.payment_id))
}

/// an installment still carrying a pending balance at the cutoff date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingEntry {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub installment: Installment,
}

/// outstanding-installments report as of a cutoff date
///
/// replays each invoice's applications dated on or before the cutoff, then
/// keeps the installments the report-time tolerance still calls unpaid
pub fn outstanding_report(
    invoices: &[Invoice],
    applications: &[PaymentApplication],
    cutoff: NaiveDate,
) -> Vec<OutstandingEntry> {
    let classifier = StatusClassifier::reporting();
    let mut by_invoice: HashMap<InvoiceId, Vec<PaymentApplication>> = HashMap::new();
    for application in applications {
        if application.application_date <= cutoff {
            by_invoice
                .entry(application.invoice_id)
                .or_default()
                .push(application.clone());
        }
    }

    let mut entries = Vec::new();
    for invoice in invoices {
        let Ok(mut schedule) = InstallmentSchedule::generate(invoice) else {
            continue;
        };
        if let Some(history) = by_invoice.get(&invoice.id) {
            allocation::replay(&mut schedule.installments, history);
        }
        for mut installment in schedule.installments {
            classifier.apply(&mut installment, cutoff);
            if installment.status != InstallmentStatus::Paid {
                entries.push(OutstandingEntry {
                    invoice_id: invoice.id,
                    invoice_number: invoice.number.clone(),
                    installment,
                });
            }
        }
    }
    entries
}
