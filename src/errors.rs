use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invoice {invoice_id} not eligible for scheduling: {reason}")]
    IneligibleInvoice {
        invoice_id: Uuid,
        reason: String,
    },

    #[error("commission rule table is empty")]
    EmptyRuleTable,

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
