use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::allocation::AllocationEvent;
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::types::{ApplicationId, ClientId, InvoiceId, PaymentId, SalespersonId};

/// description reported when no rule covers a days-overdue value
pub const NO_MATCHING_RULE: &str = "No Matching Rule";

/// one aging tier: a days-overdue range mapped to a commission rate
///
/// either bound may be open; ranges are inclusive on both ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub days_from: Option<i64>,
    pub days_to: Option<i64>,
    pub rate: Rate,
    pub description: String,
}

impl CommissionRule {
    pub fn contains(&self, days_overdue: i64) -> bool {
        let from_ok = self.days_from.map_or(true, |from| days_overdue >= from);
        let to_ok = self.days_to.map_or(true, |to| days_overdue <= to);
        from_ok && to_ok
    }
}

/// matched tier for a days-overdue value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierMatch {
    pub rate: Rate,
    pub description: String,
    /// false when no rule covered the value and the 0% fallback applied
    pub matched: bool,
}

/// ordered commission rule table
///
/// construction fails on an empty list; commission computation cannot
/// proceed without rules. a coverage gap at lookup time is survivable and
/// falls back to a flagged 0% tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<CommissionRule>,
}

impl RuleTable {
    pub fn new(mut rules: Vec<CommissionRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(LedgerError::EmptyRuleTable);
        }
        // open lower bounds sort first, then ascending days_from
        rules.sort_by_key(|r| r.days_from.unwrap_or(i64::MIN));
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[CommissionRule] {
        &self.rules
    }

    /// first rule containing the value wins, scanning in ascending
    /// days_from order
    pub fn lookup(&self, days_overdue: i64) -> TierMatch {
        for rule in &self.rules {
            if rule.contains(days_overdue) {
                return TierMatch {
                    rate: rule.rate,
                    description: rule.description.clone(),
                    matched: true,
                };
            }
        }
        warn!(days_overdue, "no commission rule covers this aging, applying 0%");
        TierMatch {
            rate: Rate::ZERO,
            description: NO_MATCHING_RULE.to_string(),
            matched: false,
        }
    }
}

/// closed reporting window over application dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(LedgerError::InvalidDate {
                message: format!("window end {end} precedes start {start}"),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// one commission ledger row per in-window (application, installment) pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionLedgerRow {
    pub salesperson_id: Option<SalespersonId>,
    pub client_id: ClientId,
    pub payment_id: PaymentId,
    pub payment_date: NaiveDate,
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub installment_sequence: u32,
    pub installment_due_date: NaiveDate,
    pub installment_amount: Money,
    pub amount_applied: Money,
    pub days_overdue: i64,
    pub rule_description: String,
    pub rate: Rate,
    /// amount_applied * rate, rounded to cents half-up
    pub commission: Money,
    /// false marks the flagged 0% no-rule fallback for operator review
    pub rule_matched: bool,
    pub application_id: ApplicationId,
}

/// invoice attribution carried onto ledger rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceAttribution {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub client_id: ClientId,
    pub salesperson_id: Option<SalespersonId>,
}

/// computes commission rows from allocation events
#[derive(Debug, Clone)]
pub struct CommissionEngine {
    rules: RuleTable,
    window: ReportingWindow,
}

impl CommissionEngine {
    pub fn new(rules: RuleTable, window: ReportingWindow) -> Self {
        Self { rules, window }
    }

    pub fn window(&self) -> ReportingWindow {
        self.window
    }

    /// compute the ledger row for one allocation event, or None when the
    /// application date falls outside the reporting window
    ///
    /// days overdue is application date minus installment due date and may
    /// be negative for early payments
    pub fn compute(
        &self,
        event: &AllocationEvent,
        attribution: &InvoiceAttribution,
    ) -> Option<CommissionLedgerRow> {
        if !self.window.contains(event.application_date) {
            return None;
        }

        let days_overdue = (event.application_date - event.installment_due_date).num_days();
        let tier = self.rules.lookup(days_overdue);
        let commission = tier.rate.apply(event.amount_applied);

        Some(CommissionLedgerRow {
            salesperson_id: attribution.salesperson_id,
            client_id: attribution.client_id,
            payment_id: event.payment_id,
            payment_date: event.application_date,
            invoice_id: attribution.invoice_id,
            invoice_number: attribution.invoice_number.clone(),
            installment_sequence: event.installment_sequence,
            installment_due_date: event.installment_due_date,
            installment_amount: event.installment_amount,
            amount_applied: event.amount_applied,
            days_overdue,
            rule_description: tier.description,
            rate: tier.rate,
            commission,
            rule_matched: tier.matched,
            application_id: event.application_id,
        })
    }

    /// compute rows for an event stream, preserving event order
    pub fn compute_all(
        &self,
        events: &[AllocationEvent],
        attribution: &InvoiceAttribution,
    ) -> Vec<CommissionLedgerRow> {
        events
            .iter()
            .filter_map(|event| self.compute(event, attribution))
            .collect()
    }
}

/// standard aging tiers used by the legacy commission report
pub fn standard_tiers() -> Vec<CommissionRule> {
    vec![
        CommissionRule {
            days_from: None,
            days_to: Some(0),
            rate: Rate::ZERO,
            description: "On time or early".to_string(),
        },
        CommissionRule {
            days_from: Some(1),
            days_to: Some(30),
            rate: Rate::from_percentage(2),
            description: "1 to 30 days".to_string(),
        },
        CommissionRule {
            days_from: Some(31),
            days_to: None,
            rate: Rate::from_percentage(5),
            description: "31 days and beyond".to_string(),
        },
    ]
}
