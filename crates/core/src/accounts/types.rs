//! Chart of accounts domain types.

use bursar_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::AccountError;

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Things the school owns (cash, receivables).
    Asset,
    /// Things the school owes.
    Liability,
    /// Residual interest.
    Equity,
    /// Tuition and other income.
    Revenue,
    /// Salaries, utilities, supplies.
    Expense,
}

impl AccountType {
    /// The conventional normal balance side for this type.
    ///
    /// - Asset/Expense: debit-normal
    /// - Liability/Equity/Revenue: credit-normal
    #[must_use]
    pub fn default_normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Lowercase name as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The side on which an account's balance increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// balance += debit - credit
    Debit,
    /// balance += credit - debit
    Credit,
}

impl NormalBalance {
    /// Signed effect of one line on an account with this normal side.
    #[must_use]
    pub fn signed_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Stable business key, unique across the chart.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Side on which the balance grows. Locked once lines reference the account.
    pub normal_balance: NormalBalance,
    /// Parent in the account tree.
    pub parent_id: Option<AccountId>,
    /// Soft-deactivation flag.
    pub is_active: bool,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Business key.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Overrides the type's conventional side (contra accounts).
    pub normal_balance: Option<NormalBalance>,
    /// Optional parent account.
    pub parent_id: Option<AccountId>,
}

impl NewAccount {
    /// Checks required fields.
    pub fn validate(&self) -> Result<(), AccountError> {
        if self.code.trim().is_empty() {
            return Err(AccountError::InvalidInput("account code is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AccountError::InvalidInput("account name is required".to_string()));
        }
        Ok(())
    }

    /// The normal balance the account will be created with.
    #[must_use]
    pub fn resolved_normal_balance(&self) -> NormalBalance {
        self.normal_balance
            .unwrap_or_else(|| self.account_type.default_normal_balance())
    }
}
