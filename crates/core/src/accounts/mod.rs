//! Chart of accounts.
//!
//! This module implements the account registry rules:
//! - Account types and normal balance sides
//! - Balance folding over posted journal lines
//! - Account creation validation and the normal-balance lock
//! - Error types for registry operations

pub mod balance;
pub mod error;
pub mod types;

pub use balance::fold_balance;
pub use error::AccountError;
pub use types::{Account, AccountType, NewAccount, NormalBalance};
