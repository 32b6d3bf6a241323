use chrono::{Datelike, NaiveDate};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{Installment, InstallmentStatus, MaturityTag};

/// classification outcome with amounts snapped against the tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub status: InstallmentStatus,
    pub paid: Money,
    pub pending: Money,
}

/// classifies installment balances against a pending-amount tolerance
///
/// two tolerances exist upstream and are kept separate on purpose: the
/// generation pass uses 0.005 and the reporting pass uses 0.01; legacy
/// reports depend on each
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusClassifier {
    tolerance: Money,
}

impl StatusClassifier {
    /// schedule-generation classifier (tolerance 0.005)
    pub fn generation() -> Self {
        Self {
            tolerance: Money::from_decimal(dec!(0.005)),
        }
    }

    /// report-time classifier (tolerance 0.01)
    pub fn reporting() -> Self {
        Self {
            tolerance: Money::from_decimal(dec!(0.01)),
        }
    }

    pub fn with_tolerance(tolerance: Money) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> Money {
        self.tolerance
    }

    /// classify a paid/pending pair; amounts within tolerance are snapped
    /// so a Paid installment reports pending 0 and a Pending one paid 0
    pub fn classify(&self, paid: Money, pending: Money) -> Classification {
        if pending <= self.tolerance {
            Classification {
                status: InstallmentStatus::Paid,
                paid,
                pending: Money::ZERO,
            }
        } else if paid > self.tolerance {
            Classification {
                status: InstallmentStatus::Partial,
                paid,
                pending,
            }
        } else {
            Classification {
                status: InstallmentStatus::Pending,
                paid: Money::ZERO,
                pending,
            }
        }
    }

    /// set status and maturity tag on an installment in place
    pub fn apply(&self, installment: &mut Installment, reference_date: NaiveDate) {
        let classification = self.classify(installment.paid, installment.pending);
        installment.status = classification.status;
        installment.paid = classification.paid;
        installment.pending = classification.pending;
        installment.maturity = maturity_tag(installment.due_date, reference_date);
    }
}

/// overdue/upcoming tag by calendar-date comparison
pub fn maturity_tag(due_date: NaiveDate, reference_date: NaiveDate) -> MaturityTag {
    if due_date < reference_date {
        MaturityTag::Overdue {
            year: due_date.year(),
        }
    } else {
        MaturityTag::Upcoming
    }
}
