//! Audit records for financial writes.
//!
//! Records are published after the write commits and delivered on a
//! best-effort basis; a lost record never fails the write.

use bursar_shared::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// System entry posted for a student payment.
    PaymentPosted,
    /// System entry posted for an expense.
    ExpensePosted,
    /// System entry posted for payroll.
    PayrollPosted,
    /// Manual draft created.
    EntryCreated,
    /// Draft approved and posted.
    EntryApproved,
    /// Draft rejected.
    EntryRejected,
    /// Payment recorded on a student ledger.
    PaymentRecorded,
    /// Charge added to a student ledger.
    ChargeAdded,
    /// Discount applied to a student ledger.
    DiscountApplied,
    /// Accounting period closed.
    PeriodClosed,
    /// Accounting period reopened.
    PeriodReopened,
}

impl AuditAction {
    /// Stable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentPosted => "payment_posted",
            Self::ExpensePosted => "expense_posted",
            Self::PayrollPosted => "payroll_posted",
            Self::EntryCreated => "entry_created",
            Self::EntryApproved => "entry_approved",
            Self::EntryRejected => "entry_rejected",
            Self::PaymentRecorded => "payment_recorded",
            Self::ChargeAdded => "charge_added",
            Self::DiscountApplied => "discount_applied",
            Self::PeriodClosed => "period_closed",
            Self::PeriodReopened => "period_reopened",
        }
    }
}

/// How much attention a record deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine write.
    Info,
    /// Workflow decision such as an approval.
    Notice,
    /// Period state change or other sensitive action.
    Critical,
}

/// A structured audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// What happened.
    pub action: AuditAction,
    /// Who did it; `None` for system actions.
    pub actor: Option<UserId>,
    /// Kind of entity touched, e.g. "journal_entry".
    pub entity_type: String,
    /// Entity id.
    pub entity_id: Uuid,
    /// Summary before the change.
    pub before: Option<Value>,
    /// Summary after the change.
    pub after: Option<Value>,
    /// Severity.
    pub severity: Severity,
    /// When the record was created.
    pub occurred_at: DateTime<Utc>,
}

impl AuditRecord {
    /// A record at `Info` severity with no summaries.
    #[must_use]
    pub fn new(action: AuditAction, entity_type: &str, entity_id: Uuid) -> Self {
        Self {
            action,
            actor: None,
            entity_type: entity_type.to_string(),
            entity_id,
            before: None,
            after: None,
            severity: Severity::Info,
            occurred_at: Utc::now(),
        }
    }

    /// Sets the actor.
    #[must_use]
    pub fn by(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Sets the before summary.
    #[must_use]
    pub fn before(mut self, summary: Value) -> Self {
        self.before = Some(summary);
        self
    }

    /// Sets the after summary.
    #[must_use]
    pub fn after(mut self, summary: Value) -> Self {
        self.after = Some(summary);
        self
    }

    /// Sets the severity.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
