//! Review workflow for manual journal entries.
//!
//! Valid transitions:
//! - Draft → Posted (approve)
//! - Draft → Rejected (reject)

use bursar_shared::types::UserId;
use chrono::{DateTime, Utc};

use super::error::JournalError;
use super::types::EntryStatus;

/// A validated transition with its audit stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Draft entry approved and posted.
    Approve {
        /// Always `Posted`.
        new_status: EntryStatus,
        /// Approver.
        approved_by: UserId,
        /// Approval time.
        approved_at: DateTime<Utc>,
        /// Notes appended to the description.
        approval_notes: Option<String>,
    },
    /// Draft entry rejected.
    Reject {
        /// Always `Rejected`.
        new_status: EntryStatus,
        /// Reviewer.
        rejected_by: UserId,
        /// Rejection time.
        rejected_at: DateTime<Utc>,
        /// Required reason.
        rejection_reason: String,
    },
}

/// Stateless service validating entry status transitions.
pub struct EntryWorkflow;

impl EntryWorkflow {
    /// Approve a draft entry.
    ///
    /// Balance is re-validated by the caller against the stored lines.
    pub fn approve(
        current_status: EntryStatus,
        approved_by: UserId,
        approval_notes: Option<String>,
    ) -> Result<WorkflowAction, JournalError> {
        match current_status {
            EntryStatus::Draft => Ok(WorkflowAction::Approve {
                new_status: EntryStatus::Posted,
                approved_by,
                approved_at: Utc::now(),
                approval_notes: approval_notes.filter(|n| !n.trim().is_empty()),
            }),
            _ => Err(JournalError::InvalidTransition {
                from: current_status,
                to: EntryStatus::Posted,
            }),
        }
    }

    /// Reject a draft entry.
    pub fn reject(
        current_status: EntryStatus,
        rejected_by: UserId,
        rejection_reason: String,
    ) -> Result<WorkflowAction, JournalError> {
        if rejection_reason.trim().is_empty() {
            return Err(JournalError::RejectionReasonRequired);
        }

        match current_status {
            EntryStatus::Draft => Ok(WorkflowAction::Reject {
                new_status: EntryStatus::Rejected,
                rejected_by,
                rejected_at: Utc::now(),
                rejection_reason,
            }),
            _ => Err(JournalError::InvalidTransition {
                from: current_status,
                to: EntryStatus::Rejected,
            }),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: EntryStatus, to: EntryStatus) -> bool {
        matches!(
            (from, to),
            (EntryStatus::Draft, EntryStatus::Posted | EntryStatus::Rejected)
        )
    }

    /// Description with approval notes appended.
    #[must_use]
    pub fn description_with_notes(description: &str, notes: Option<&str>) -> String {
        match notes {
            Some(notes) => format!("{description} | Approval notes: {notes}"),
            None => description.to_string(),
        }
    }
}
