//! Period closing and reopening rules.
//!
//! Closing requires, in order:
//! 1. The period is open
//! 2. No draft journal entry is dated inside the period
//! 3. The trial balance as of the period end is balanced
//!
//! Storage evaluates these under a lock on the period row and flips the flag
//! in the same transaction.

use bursar_shared::types::UserId;
use chrono::{NaiveDate, Utc};

use super::error::PeriodError;
use super::types::AccountingPeriod;
use crate::ports::TrialBalanceSummary;

/// Stateless closing gate.
pub struct ClosingGate;

impl ClosingGate {
    /// Fails if the period is already closed.
    pub fn ensure_open(period: &AccountingPeriod) -> Result<(), PeriodError> {
        if period.is_closed {
            return Err(PeriodError::AlreadyClosed(period.name.clone()));
        }
        Ok(())
    }

    /// Fails if any draft entry falls in the period.
    pub fn ensure_no_drafts(
        period: &AccountingPeriod,
        draft_count: u64,
    ) -> Result<(), PeriodError> {
        if draft_count > 0 {
            return Err(PeriodError::DraftEntriesInRange {
                period: period.name.clone(),
                count: draft_count,
                start: period.start_date,
                end: period.end_date,
            });
        }
        Ok(())
    }

    /// Fails if the trial balance does not balance.
    pub fn ensure_trial_balance(
        period: &AccountingPeriod,
        trial_balance: &TrialBalanceSummary,
    ) -> Result<(), PeriodError> {
        if !trial_balance.is_balanced {
            return Err(PeriodError::TrialBalanceUnbalanced {
                period: period.name.clone(),
                as_of: trial_balance.as_of,
                difference: trial_balance.difference,
            });
        }
        Ok(())
    }

    /// Marks the period closed.
    pub fn close(period: &mut AccountingPeriod, actor: UserId, notes: Option<String>) {
        period.is_closed = true;
        period.closed_by = Some(actor);
        period.closed_at = Some(Utc::now());
        period.closing_notes = notes.filter(|n| !n.trim().is_empty());
    }

    /// Checks that the period can be reopened with `reason`.
    pub fn check_reopen(period: &AccountingPeriod, reason: &str) -> Result<(), PeriodError> {
        if !period.is_closed {
            return Err(PeriodError::NotClosed(period.name.clone()));
        }
        if reason.trim().is_empty() {
            return Err(PeriodError::ReopenReasonRequired);
        }
        Ok(())
    }

    /// Clears the closed state and records who reopened it and why.
    pub fn reopen(period: &mut AccountingPeriod, actor: UserId, reason: String) {
        period.is_closed = false;
        period.closed_by = None;
        period.closed_at = None;
        period.reopened_by = Some(actor);
        period.reopened_at = Some(Utc::now());
        period.reopen_reason = Some(reason);
    }
}

/// Returns true if `date` falls inside any closed period.
#[must_use]
pub fn is_date_frozen(periods: &[AccountingPeriod], date: NaiveDate) -> bool {
    periods
        .iter()
        .any(|p| p.is_closed && p.contains_date(date))
}
