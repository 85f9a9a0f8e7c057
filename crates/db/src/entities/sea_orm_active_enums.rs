//! `SeaORM` active enums mapped to Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use bursar_core::{accounts, billing, journal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "normal_balance")]
pub enum NormalBalance {
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "credit")]
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_entry_status")]
pub enum JournalEntryStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_reference_type")]
pub enum JournalReferenceType {
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "expense")]
    Expense,
    #[sea_orm(string_value = "payroll")]
    Payroll,
    #[sea_orm(string_value = "manual")]
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_status")]
pub enum LedgerStatus {
    #[sea_orm(string_value = "Unpaid")]
    Unpaid,
    #[sea_orm(string_value = "Partially Paid")]
    PartiallyPaid,
    #[sea_orm(string_value = "Fully Paid")]
    FullyPaid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_charge_type")]
pub enum LedgerChargeType {
    #[sea_orm(string_value = "Tuition")]
    Tuition,
    #[sea_orm(string_value = "Misc")]
    Misc,
    #[sea_orm(string_value = "Other")]
    Other,
    #[sea_orm(string_value = "Adjustment")]
    Adjustment,
    #[sea_orm(string_value = "Discount")]
    Discount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "online")]
    Online,
}

/// Maps a storage enum to and from its domain twin, variant for variant.
macro_rules! mirror_enum {
    ($db:ty, $domain:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $domain {
            fn from(value: $db) -> Self {
                type Source = $db;
                match value {
                    $(Source::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$domain> for $db {
            fn from(value: $domain) -> Self {
                type Source = $domain;
                match value {
                    $(Source::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(AccountType, accounts::AccountType, [Asset, Liability, Equity, Revenue, Expense]);
mirror_enum!(NormalBalance, accounts::NormalBalance, [Debit, Credit]);
mirror_enum!(JournalEntryStatus, journal::EntryStatus, [Draft, Posted, Rejected]);
mirror_enum!(
    JournalReferenceType,
    journal::ReferenceType,
    [Payment, Expense, Payroll, Manual]
);
mirror_enum!(LedgerStatus, billing::LedgerStatus, [Unpaid, PartiallyPaid, FullyPaid]);
mirror_enum!(
    LedgerChargeType,
    billing::ChargeType,
    [Tuition, Misc, Other, Adjustment, Discount]
);
mirror_enum!(
    PaymentMethod,
    billing::PaymentMethod,
    [Cash, Check, BankTransfer, Online]
);
