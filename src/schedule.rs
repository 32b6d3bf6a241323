use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{CreditTerms, Installment, Invoice, InvoiceId};

/// amortization schedule for one invoice
///
/// the set is regenerated whole on every scheduling run; individual
/// installments are never edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentSchedule {
    pub invoice_id: InvoiceId,
    pub total: Money,
    pub terms: CreditTerms,
    pub base_date: NaiveDate,
    pub installments: Vec<Installment>,
    /// date-arithmetic failures survived during generation
    pub date_errors: u32,
}

impl InstallmentSchedule {
    /// generate the installment set for an invoice
    ///
    /// explicit credit terms are used directly; without them the invoice
    /// gets a single installment whose interval spans base date to due date.
    /// amounts divide equally with the final installment absorbing the
    /// rounding remainder, so the set always reconciles to the total
    pub fn generate(invoice: &Invoice) -> Result<Self> {
        let total = invoice.total.ok_or_else(|| ineligible(invoice, "missing total"))?;
        let base_date = invoice
            .base_date()
            .ok_or_else(|| ineligible(invoice, "missing base date"))?;

        let mut date_errors = 0u32;
        let terms = match invoice.terms {
            Some(terms) => {
                if terms.installment_count == 0 {
                    return Err(ineligible(invoice, "zero installment count"));
                }
                if terms.interval_days < 0 {
                    return Err(ineligible(invoice, "negative installment interval"));
                }
                terms
            }
            None => CreditTerms {
                installment_count: 1,
                interval_days: default_interval(invoice, base_date, &mut date_errors),
            },
        };

        let count = terms.installment_count;
        let base_amount = (total / Decimal::from(count)).round_dp(2);
        let all_but_last = base_amount * Decimal::from(count - 1);

        let mut installments = Vec::with_capacity(count as usize);
        for sequence in 1..=count {
            let due_date = due_date_for(base_date, sequence, terms.interval_days, &mut date_errors);
            let amount = if sequence == count {
                (total - all_but_last).round_dp(2)
            } else {
                base_amount
            };
            installments.push(Installment::new(sequence, due_date, amount));
        }

        Ok(Self {
            invoice_id: invoice.id,
            total,
            terms,
            base_date,
            installments,
            date_errors,
        })
    }

    /// sum of nominal installment amounts; equals the invoice total
    pub fn total_scheduled(&self) -> Money {
        self.installments
            .iter()
            .map(|i| i.amount)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    /// get installment by sequence number
    pub fn get(&self, sequence: u32) -> Option<&Installment> {
        self.installments.get((sequence as usize).checked_sub(1)?)
    }
}

fn ineligible(invoice: &Invoice, reason: &str) -> LedgerError {
    LedgerError::IneligibleInvoice {
        invoice_id: invoice.id,
        reason: reason.to_string(),
    }
}

/// interval for the implicit single-installment terms: due date minus issue
/// date, clamped to zero; a missing due date degrades to a zero interval.
/// the delivery date only moves the anchor the interval is added to, never
/// the interval itself
fn default_interval(invoice: &Invoice, base_date: NaiveDate, date_errors: &mut u32) -> i64 {
    match invoice.due_date {
        Some(due) => (due - invoice.issue_date.unwrap_or(base_date)).num_days().max(0),
        None => {
            warn!(invoice = %invoice.number, "no due date for implicit terms, interval defaults to 0");
            *date_errors += 1;
            0
        }
    }
}

/// due date for installment `sequence`: base date + sequence * interval.
/// overflow falls back to the base date and is counted, never fatal
fn due_date_for(
    base_date: NaiveDate,
    sequence: u32,
    interval_days: i64,
    date_errors: &mut u32,
) -> NaiveDate {
    let offset = (sequence as i64).checked_mul(interval_days);
    let due = offset
        .and_then(|days| base_date.checked_add_signed(Duration::days(days)));
    match due {
        Some(date) => date,
        None => {
            *date_errors += 1;
            base_date
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(total: &str, count: u32, interval: i64) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            number: "F-1001".to_string(),
            client_id: Uuid::new_v4(),
            salesperson_id: None,
            total: Some(Money::from_str_exact(total).unwrap()),
            issue_date: Some(date(2025, 1, 1)),
            delivery_date: None,
            due_date: Some(date(2025, 3, 1)),
            terms: Some(CreditTerms {
                installment_count: count,
                interval_days: interval,
            }),
            collected_total: Money::ZERO,
        }
    }

    #[test]
    fn test_generate_three_installments() {
        let schedule = InstallmentSchedule::generate(&invoice("300.00", 3, 30)).unwrap();
        assert_eq!(schedule.installments.len(), 3);
        assert_eq!(schedule.installments[0].due_date, date(2025, 1, 31));
        assert_eq!(schedule.installments[1].due_date, date(2025, 3, 2));
        assert_eq!(schedule.installments[2].due_date, date(2025, 4, 1));
        for installment in &schedule.installments {
            assert_eq!(installment.amount, Money::from_decimal(dec!(100.00)));
        }
        assert_eq!(schedule.date_errors, 0);
        assert_eq!(schedule.get(2).unwrap().due_date, date(2025, 3, 2));
        assert!(schedule.get(4).is_none());
        assert!(schedule.get(0).is_none());
    }

    #[test]
    fn test_amount_conservation() {
        for count in 1..=13 {
            let schedule = InstallmentSchedule::generate(&invoice("100.00", count, 15)).unwrap();
            assert_eq!(
                schedule.total_scheduled(),
                Money::from_decimal(dec!(100.00)),
                "N = {count}"
            );
        }
    }

    #[test]
    fn test_last_installment_absorbs_remainder() {
        let schedule = InstallmentSchedule::generate(&invoice("100.00", 3, 30)).unwrap();
        assert_eq!(schedule.installments[0].amount, Money::from_decimal(dec!(33.33)));
        assert_eq!(schedule.installments[1].amount, Money::from_decimal(dec!(33.33)));
        assert_eq!(schedule.installments[2].amount, Money::from_decimal(dec!(33.34)));
    }

    #[test]
    fn test_due_dates_strictly_increasing() {
        let schedule = InstallmentSchedule::generate(&invoice("500.00", 6, 7)).unwrap();
        for pair in schedule.installments.windows(2) {
            assert!(pair[0].due_date < pair[1].due_date);
        }
        // no day-zero installment
        assert!(schedule.installments[0].due_date > schedule.base_date);
    }

    #[test]
    fn test_default_single_installment() {
        let mut inv = invoice("250.00", 1, 0);
        inv.terms = None;
        let schedule = InstallmentSchedule::generate(&inv).unwrap();
        assert_eq!(schedule.installments.len(), 1);
        assert_eq!(schedule.terms.interval_days, 59); // 2025-01-01 -> 2025-03-01
        assert_eq!(schedule.installments[0].due_date, date(2025, 3, 1));
        assert_eq!(schedule.installments[0].amount, Money::from_decimal(dec!(250.00)));
    }

    #[test]
    fn test_default_interval_from_issue_date() {
        let mut inv = invoice("250.00", 1, 0);
        inv.terms = None;
        // interval spans issue to due (59 days), the anchor is the delivery
        // date, so the installment lands at delivery + 59
        inv.delivery_date = Some(date(2025, 1, 10));
        let schedule = InstallmentSchedule::generate(&inv).unwrap();
        assert_eq!(schedule.terms.interval_days, 59);
        assert_eq!(schedule.base_date, date(2025, 1, 10));
        assert_eq!(schedule.installments[0].due_date, date(2025, 3, 10));
    }

    #[test]
    fn test_default_interval_clamped() {
        let mut inv = invoice("250.00", 1, 0);
        inv.terms = None;
        // issued after the due date: interval clamps to zero
        inv.issue_date = Some(date(2025, 4, 1));
        let schedule = InstallmentSchedule::generate(&inv).unwrap();
        assert_eq!(schedule.terms.interval_days, 0);
        assert_eq!(schedule.installments[0].due_date, date(2025, 4, 1));

        inv.due_date = None;
        let schedule = InstallmentSchedule::generate(&inv).unwrap();
        assert_eq!(schedule.terms.interval_days, 0);
        assert_eq!(schedule.date_errors, 1);
    }

    #[test]
    fn test_ineligible_invoices() {
        let mut no_total = invoice("100.00", 2, 30);
        no_total.total = None;
        assert!(matches!(
            InstallmentSchedule::generate(&no_total),
            Err(LedgerError::IneligibleInvoice { .. })
        ));

        let mut no_dates = invoice("100.00", 2, 30);
        no_dates.issue_date = None;
        no_dates.delivery_date = None;
        assert!(InstallmentSchedule::generate(&no_dates).is_err());

        let zero_count = invoice("100.00", 0, 30);
        assert!(InstallmentSchedule::generate(&zero_count).is_err());

        let negative_interval = invoice("100.00", 2, -5);
        assert!(InstallmentSchedule::generate(&negative_interval).is_err());
    }

    #[test]
    fn test_delivery_date_wins_as_base() {
        let mut inv = invoice("300.00", 3, 30);
        inv.delivery_date = Some(date(2025, 2, 1));
        let schedule = InstallmentSchedule::generate(&inv).unwrap();
        assert_eq!(schedule.base_date, date(2025, 2, 1));
        assert_eq!(schedule.installments[0].due_date, date(2025, 3, 3));
    }
}
