//! Core business logic for Bursar.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts and balance folding
//! - `journal` - Journal entry validation, numbering, review workflow and system postings
//! - `billing` - Student ledgers, fee schedules, discounts and payments
//! - `period` - Accounting periods and the closing gate
//! - `ports` - Collaborators supplied by the host application
//! - `audit` - Audit records for financial writes

pub mod accounts;
pub mod audit;
pub mod billing;
pub mod journal;
pub mod period;
pub mod ports;
