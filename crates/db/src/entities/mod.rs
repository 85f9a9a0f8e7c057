//! `SeaORM` entity definitions.

#![allow(missing_docs)]

pub mod accounting_periods;
pub mod accounts;
pub mod journal_entries;
pub mod journal_entry_lines;
pub mod journal_entry_sequences;
pub mod ledger_charges;
pub mod ledger_payments;
pub mod official_receipts;
pub mod payment_logs;
pub mod sea_orm_active_enums;
pub mod student_ledgers;
