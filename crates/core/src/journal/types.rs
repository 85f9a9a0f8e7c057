//! Journal domain types for entry creation, review and posting.

use bursar_shared::types::{AccountId, JournalEntryId, JournalLineId, UserId, within_tolerance};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Journal entry status.
///
/// `Draft → Posted` (approval) or `Draft → Rejected` (rejection). Both
/// targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Awaiting review; does not count toward balances.
    Draft,
    /// Final; counts toward account balances.
    Posted,
    /// Refused by a reviewer.
    Rejected,
}

impl EntryStatus {
    /// Returns true if lines may still change.
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Posted | Self::Rejected)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Posted => write!(f, "posted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Business event an entry originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    /// Student payment.
    Payment,
    /// Approved expense.
    Expense,
    /// Paid payroll (single or batch).
    Payroll,
    /// Manually keyed entry.
    Manual,
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Payment => write!(f, "payment"),
            Self::Expense => write!(f, "expense"),
            Self::Payroll => write!(f, "payroll"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A journal entry header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// `JE-<year>-<seq>`, unique.
    pub entry_number: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Free-text description (approval notes are appended).
    pub description: String,
    /// Originating event type.
    pub reference_type: ReferenceType,
    /// Originating event id.
    pub reference_id: Option<Uuid>,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Creator.
    pub created_by: UserId,
    /// Approver, for posted entries.
    pub approved_by: Option<UserId>,
    /// When the entry was posted.
    pub approved_at: Option<DateTime<Utc>>,
    /// Reviewer who rejected the entry.
    pub rejected_by: Option<UserId>,
    /// Why it was rejected.
    pub rejection_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A single journal line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// Parent entry.
    pub entry_id: JournalEntryId,
    /// 1-based, unique within the entry.
    pub line_number: i32,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
}

/// Caller-supplied line of a manual entry.
#[derive(Debug, Clone)]
pub struct LineInput {
    /// Account to post to (must exist and be active).
    pub account_id: AccountId,
    /// Debit amount, zero if this is a credit line.
    pub debit: Decimal,
    /// Credit amount, zero if this is a debit line.
    pub credit: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
}

impl LineInput {
    /// A debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }
}

/// A line addressed by well-known account code, produced by posting builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedLine {
    /// Chart code resolved to an account at persistence time.
    pub account_code: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
}

/// A system-generated entry, balanced by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingTemplate {
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Header description.
    pub description: String,
    /// Originating event type.
    pub reference_type: ReferenceType,
    /// Originating event id.
    pub reference_id: Uuid,
    /// Lines in posting order.
    pub lines: Vec<CodedLine>,
}

impl PostingTemplate {
    /// Debit and credit totals of the template.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals::from_amounts(self.lines.iter().map(|l| (l.debit, l.credit)))
    }
}

/// Sum of debits and credits of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    /// Total debits.
    pub debit: Decimal,
    /// Total credits.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Sums `(debit, credit)` pairs.
    pub fn from_amounts<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        amounts.into_iter().fold(
            Self {
                debit: Decimal::ZERO,
                credit: Decimal::ZERO,
            },
            |acc, (debit, credit)| Self {
                debit: acc.debit + debit,
                credit: acc.credit + credit,
            },
        )
    }

    /// Debits minus credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true if debits equal credits within `tolerance`.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        within_tolerance(self.debit, self.credit, tolerance)
    }
}

/// Entry header with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryWithLines {
    /// The header.
    pub entry: JournalEntry,
    /// Lines ordered by line number.
    pub lines: Vec<JournalLine>,
}

/// A line of a pending entry with its account resolved for human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLine {
    /// The line.
    pub line: JournalLine,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
}

/// A draft entry awaiting approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
    /// The header.
    pub entry: JournalEntry,
    /// Lines with account names and codes.
    pub lines: Vec<ReviewLine>,
    /// Total debits.
    pub total_debit: Decimal,
    /// Total credits.
    pub total_credit: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_status_editable() {
        assert!(EntryStatus::Draft.is_editable());
        assert!(!EntryStatus::Posted.is_editable());
        assert!(!EntryStatus::Rejected.is_editable());
    }

    #[test]
    fn test_entry_status_terminal() {
        assert!(!EntryStatus::Draft.is_terminal());
        assert!(EntryStatus::Posted.is_terminal());
        assert!(EntryStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_totals_balanced() {
        let totals = EntryTotals::from_amounts(vec![(dec!(100), dec!(0)), (dec!(0), dec!(100))]);
        assert!(totals.is_balanced(dec!(0.01)));
        assert_eq!(totals.difference(), Decimal::ZERO);
    }

    #[test]
    fn test_totals_unbalanced() {
        let totals = EntryTotals::from_amounts(vec![(dec!(500), dec!(0)), (dec!(0), dec!(300))]);
        assert!(!totals.is_balanced(dec!(0.01)));
        assert_eq!(totals.difference(), dec!(200));
    }

    #[test]
    fn test_totals_within_tolerance() {
        let totals = EntryTotals::from_amounts(vec![(dec!(100.01), dec!(0)), (dec!(0), dec!(100))]);
        assert!(totals.is_balanced(dec!(0.01)));
        assert!(!totals.is_balanced(Decimal::ZERO));
    }
}
