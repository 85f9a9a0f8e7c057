//! Journal engine rules.
//!
//! - Manual entries are validated and stored as `Draft`
//! - System postings (payment, expense, payroll) are balanced by construction
//!   and stored as `Posted`
//! - Entry numbers are `JE-<year>-<seq>`

pub mod error;
pub mod numbering;
pub mod postings;
pub mod types;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod validation_props;

pub use error::JournalError;
pub use numbering::{
    ENTRY_NUMBER_PREFIX, format_entry_number, next_sequence, parse_sequence, year_prefix,
};
pub use postings::{
    Expense, ExpenseStatus, PaymentEvent, PayrollStatus, PayrollTransaction,
    expense_account_code, expense_posting, payment_posting, payroll_batch_posting,
    payroll_posting,
};
pub use types::{
    CodedLine, EntryStatus, EntryTotals, EntryWithLines, JournalEntry, JournalLine, LineInput,
    PendingEntry, PostingTemplate, ReferenceType, ReviewLine,
};
pub use validation::{ensure_balanced, validate_line_accounts, validate_manual_lines};
pub use workflow::{EntryWorkflow, WorkflowAction};
