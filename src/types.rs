use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for an invoice
pub type InvoiceId = Uuid;
/// unique identifier for a client
pub type ClientId = Uuid;
/// unique identifier for a salesperson
pub type SalespersonId = Uuid;
/// unique identifier for a payment
pub type PaymentId = Uuid;
/// unique identifier for a payment application (reconciliation record)
pub type ApplicationId = Uuid;

/// credit terms attached to an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTerms {
    /// number of installments, must be >= 1 to be schedulable
    pub installment_count: u32,
    /// days between consecutive installment due dates
    pub interval_days: i64,
}

/// invoice header record, externally supplied and read-only to the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: String,
    pub client_id: ClientId,
    pub salesperson_id: Option<SalespersonId>,
    pub total: Option<Money>,
    pub issue_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub terms: Option<CreditTerms>,
    /// total already collected against this invoice, as reported by the
    /// payment-reconciliation snapshot
    pub collected_total: Money,
}

impl Invoice {
    /// scheduling base date: delivery date when present, else issue date
    pub fn base_date(&self) -> Option<NaiveDate> {
        self.delivery_date.or(self.issue_date)
    }
}

/// reconciliation record linking one payment to one invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub id: ApplicationId,
    pub invoice_id: InvoiceId,
    pub payment_id: PaymentId,
    /// amount applied to the invoice, in the invoice currency
    pub amount: Money,
    /// equivalent amount in a secondary currency, when carried
    pub secondary_amount: Option<Money>,
    pub application_date: NaiveDate,
}

impl PaymentApplication {
    /// only strictly positive applications participate in allocation
    pub fn is_allocatable(&self) -> bool {
        self.amount.is_positive()
    }

    /// exchange ratio secondary / applied; None when not derivable
    pub fn fx_rate(&self) -> Option<Rate> {
        let secondary = self.secondary_amount?;
        if self.amount.is_zero() {
            return None;
        }
        Some(Rate::from_decimal(
            secondary.as_decimal() / self.amount.as_decimal(),
        ))
    }
}

/// payment status of an installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    /// pending balance within tolerance of zero
    Paid,
    /// some amount collected, some still pending
    Partial,
    /// nothing collected beyond tolerance
    Pending,
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallmentStatus::Paid => write!(f, "Paid"),
            InstallmentStatus::Partial => write!(f, "Partial"),
            InstallmentStatus::Pending => write!(f, "Pending"),
        }
    }
}

/// maturity tag relative to a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaturityTag {
    /// due date earlier than the reference date; carries the due-date year
    Overdue { year: i32 },
    /// due date on or after the reference date
    Upcoming,
}

impl fmt::Display for MaturityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaturityTag::Overdue { year } => write!(f, "Overdue {year}"),
            MaturityTag::Upcoming => write!(f, "Upcoming"),
        }
    }
}

/// one scheduled partial-payment obligation of an invoice
///
/// paid/pending are derived from payment history, never edited in place;
/// the whole set is regenerated when the schedule is rebuilt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 1..N, unique within the invoice
    pub sequence: u32,
    pub due_date: NaiveDate,
    /// nominal amount owed by this installment
    pub amount: Money,
    pub paid: Money,
    pub pending: Money,
    pub status: InstallmentStatus,
    pub maturity: MaturityTag,
}

impl Installment {
    pub fn new(sequence: u32, due_date: NaiveDate, amount: Money) -> Self {
        Self {
            sequence,
            due_date,
            amount,
            paid: Money::ZERO,
            pending: amount,
            status: InstallmentStatus::Pending,
            maturity: MaturityTag::Upcoming,
        }
    }

    /// fully settled, nothing left to allocate against
    pub fn is_settled(&self) -> bool {
        !self.pending.is_positive()
    }
}
