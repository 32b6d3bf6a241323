pub mod allocation;
pub mod batch;
pub mod commission;
pub mod decimal;
pub mod errors;
pub mod schedule;
pub mod status;
pub mod types;

// re-export key types
pub use allocation::AllocationEvent;
pub use batch::{
    outstanding_report, regenerate_schedules, run_commission_report, CommissionReport,
    CommissionRunSummary, OutstandingEntry, ScheduleRun, ScheduleRunSummary,
};
pub use commission::{
    CommissionEngine, CommissionLedgerRow, CommissionRule, InvoiceAttribution, ReportingWindow,
    RuleTable, TierMatch,
};
pub use decimal::{Money, Rate};
pub use errors::{LedgerError, Result};
pub use schedule::InstallmentSchedule;
pub use status::{Classification, StatusClassifier};
pub use types::{
    ApplicationId, ClientId, CreditTerms, Installment, InstallmentStatus, Invoice, InvoiceId,
    MaturityTag, PaymentApplication, PaymentId, SalespersonId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
