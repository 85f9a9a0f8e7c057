//! Per-student, per-school-year billing ledgers.
//!
//! This module implements the student ledger rules:
//! - Canonical grade levels and fee schedules
//! - Discount amount computation
//! - Totals and status derivation
//! - The ledger aggregate with its payment and discount gates
//! - Error types for ledger operations

pub mod book;
pub mod discount;
pub mod error;
pub mod fees;
pub mod grade;
pub mod totals;
pub mod types;

#[cfg(test)]
mod totals_props;

pub use book::{LedgerBook, Population};
pub use discount::{DiscountConfig, DiscountRate};
pub use error::BillingError;
pub use fees::{FeeSchedule, PlannedCharge};
pub use grade::GradeLevel;
pub use totals::LedgerTotals;
pub use types::{
    ChargeType, LedgerCharge, LedgerPayment, LedgerStatus, NewPayment, PaymentMethod,
    StudentLedger,
};
