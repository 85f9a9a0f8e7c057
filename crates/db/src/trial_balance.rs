//! Trial balance over posted journal lines.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait,
};
use tracing::debug;

use bursar_core::ports::{CollaboratorError, TrialBalanceCalculator, TrialBalanceSummary};

use crate::entities::{
    journal_entries, journal_entry_lines, sea_orm_active_enums::JournalEntryStatus,
};

/// Sums debits and credits of every posted line dated on or before the
/// as-of date.
#[derive(Debug, Clone)]
pub struct PostedLinesTrialBalance {
    db: DatabaseConnection,
    tolerance: Decimal,
}

impl PostedLinesTrialBalance {
    /// Creates a calculator comparing totals within `tolerance`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, tolerance: Decimal) -> Self {
        Self { db, tolerance }
    }
}

#[async_trait]
impl TrialBalanceCalculator for PostedLinesTrialBalance {
    async fn trial_balance(
        &self,
        as_of: NaiveDate,
    ) -> Result<TrialBalanceSummary, CollaboratorError> {
        // SUM over no rows is NULL, hence the options.
        let totals: Option<(Option<Decimal>, Option<Decimal>)> =
            journal_entry_lines::Entity::find()
                .join(
                    JoinType::InnerJoin,
                    journal_entry_lines::Relation::JournalEntries.def(),
                )
                .filter(journal_entries::Column::Status.eq(JournalEntryStatus::Posted))
                .filter(journal_entries::Column::EntryDate.lte(as_of))
                .select_only()
                .column_as(journal_entry_lines::Column::Debit.sum(), "total_debit")
                .column_as(journal_entry_lines::Column::Credit.sum(), "total_credit")
                .into_tuple()
                .one(&self.db)
                .await
                .map_err(|e| CollaboratorError::Failed(format!("trial balance query: {e}")))?;

        let (debit, credit) = totals.unwrap_or_default();
        let total_debit = debit.unwrap_or_default();
        let total_credit = credit.unwrap_or_default();
        debug!(%as_of, %total_debit, %total_credit, "trial balance computed");

        Ok(TrialBalanceSummary::from_totals(
            as_of,
            total_debit,
            total_credit,
            self.tolerance,
        ))
    }
}
