//! Collaborators consumed by the ledger engine.
//!
//! Fee schedules, discount configuration, the active school year, the trial
//! balance and the audit sink live outside this crate. Storage depends on
//! these traits only; configuration-backed implementations are provided for
//! deployments that keep fee tables in config.

use std::collections::HashMap;

use async_trait::async_trait;
use bursar_shared::types::{DiscountId, within_tolerance};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::AuditRecord;
use crate::billing::{BillingError, DiscountConfig, FeeSchedule, GradeLevel};
use crate::period::PeriodError;

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached.
    #[error("{0} is unavailable")]
    Unavailable(String),

    /// The collaborator answered with an error.
    #[error("{0}")]
    Failed(String),
}

impl From<CollaboratorError> for BillingError {
    fn from(err: CollaboratorError) -> Self {
        Self::Collaborator(err.to_string())
    }
}

impl From<CollaboratorError> for PeriodError {
    fn from(err: CollaboratorError) -> Self {
        Self::Collaborator(err.to_string())
    }
}

/// Fee schedule per grade level.
#[async_trait]
pub trait FeeScheduleProvider: Send + Sync {
    /// Schedule for `grade`, or `None` if none is configured.
    async fn fee_schedule(&self, grade: GradeLevel)
    -> Result<Option<FeeSchedule>, CollaboratorError>;
}

/// Discount configuration lookup.
#[async_trait]
pub trait DiscountConfigStore: Send + Sync {
    /// Discount by id, or `None` if unknown.
    async fn discount(&self, id: DiscountId) -> Result<Option<DiscountConfig>, CollaboratorError>;
}

/// Resolves the single open school year.
#[async_trait]
pub trait SchoolYearResolver: Send + Sync {
    /// Name of the open school year, or `None` if none is open.
    async fn active_school_year(&self) -> Result<Option<String>, CollaboratorError>;
}

/// Computes the trial balance used to gate period closing.
#[async_trait]
pub trait TrialBalanceCalculator: Send + Sync {
    /// Trial balance over posted entries dated on or before `as_of`.
    async fn trial_balance(&self, as_of: NaiveDate)
    -> Result<TrialBalanceSummary, CollaboratorError>;
}

/// Receives audit records. Never awaited on the write path.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Stores or forwards one record.
    async fn record(&self, record: AuditRecord) -> Result<(), CollaboratorError>;
}

/// Result of a trial balance calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceSummary {
    /// As-of date.
    pub as_of: NaiveDate,
    /// Total debits.
    pub total_debit: Decimal,
    /// Total credits.
    pub total_credit: Decimal,
    /// Debits minus credits.
    pub difference: Decimal,
    /// Whether the difference is within tolerance.
    pub is_balanced: bool,
}

impl TrialBalanceSummary {
    /// Builds a summary from totals.
    #[must_use]
    pub fn from_totals(
        as_of: NaiveDate,
        total_debit: Decimal,
        total_credit: Decimal,
        tolerance: Decimal,
    ) -> Self {
        Self {
            as_of,
            total_debit,
            total_credit,
            difference: total_debit - total_credit,
            is_balanced: within_tolerance(total_debit, total_credit, tolerance),
        }
    }
}

/// Fee schedules held in memory, keyed by grade level.
#[derive(Debug, Clone, Default)]
pub struct StaticFeeSchedules {
    schedules: HashMap<GradeLevel, FeeSchedule>,
}

impl StaticFeeSchedules {
    /// Builds the table from a list of schedules; later entries win.
    #[must_use]
    pub fn new(schedules: impl IntoIterator<Item = FeeSchedule>) -> Self {
        Self {
            schedules: schedules
                .into_iter()
                .map(|s| (s.grade_level, s))
                .collect(),
        }
    }
}

#[async_trait]
impl FeeScheduleProvider for StaticFeeSchedules {
    async fn fee_schedule(
        &self,
        grade: GradeLevel,
    ) -> Result<Option<FeeSchedule>, CollaboratorError> {
        Ok(self.schedules.get(&grade).cloned())
    }
}

/// Discount configurations held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscounts {
    discounts: HashMap<DiscountId, DiscountConfig>,
}

impl StaticDiscounts {
    /// Builds the table from a list of discounts.
    #[must_use]
    pub fn new(discounts: impl IntoIterator<Item = DiscountConfig>) -> Self {
        Self {
            discounts: discounts.into_iter().map(|d| (d.id, d)).collect(),
        }
    }
}

#[async_trait]
impl DiscountConfigStore for StaticDiscounts {
    async fn discount(&self, id: DiscountId) -> Result<Option<DiscountConfig>, CollaboratorError> {
        Ok(self.discounts.get(&id).cloned())
    }
}

/// A school year fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct FixedSchoolYear(pub Option<String>);

#[async_trait]
impl SchoolYearResolver for FixedSchoolYear {
    async fn active_school_year(&self) -> Result<Option<String>, CollaboratorError> {
        Ok(self.0.clone())
    }
}
