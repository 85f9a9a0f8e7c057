//! Accounting period repository.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use tracing::{error, info, warn};

use bursar_core::audit::{AuditAction, AuditRecord, Severity};
use bursar_core::period::{AccountingPeriod, ClosingGate, PeriodError, PeriodSpan, is_date_frozen};
use bursar_core::ports::TrialBalanceCalculator;
use bursar_shared::types::{AccountingPeriodId, UserId};

use super::journal::count_drafts_in_range;
use super::violates_unique;
use crate::audit::AuditOutbox;
use crate::entities::accounting_periods;

const YEAR_MONTH_CONSTRAINT: &str = "uq_accounting_periods_year_month";

/// Accounting period repository.
#[derive(Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
    trial_balance: Arc<dyn TrialBalanceCalculator>,
    audit: AuditOutbox,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        trial_balance: Arc<dyn TrialBalanceCalculator>,
        audit: AuditOutbox,
    ) -> Self {
        Self {
            db,
            trial_balance,
            audit,
        }
    }

    /// Gets the period for `(year, month)`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` for an out-of-range month.
    pub async fn get_or_create_period(
        &self,
        year: i32,
        month: u32,
    ) -> Result<AccountingPeriod, PeriodError> {
        let span = PeriodSpan::for_month(year, month)?;
        let month_key =
            i32::try_from(month).map_err(|_| PeriodError::InvalidPeriod { year, month })?;

        if let Some(existing) = self.find_by_year_month(year, month_key).await? {
            return Ok(to_period(existing));
        }

        let now = Utc::now().into();
        let model = accounting_periods::ActiveModel {
            id: Set(AccountingPeriodId::new().into_inner()),
            year: Set(year),
            month: Set(month_key),
            name: Set(span.name),
            start_date: Set(span.start_date),
            end_date: Set(span.end_date),
            is_closed: Set(false),
            closed_by: Set(None),
            closed_at: Set(None),
            closing_notes: Set(None),
            reopened_by: Set(None),
            reopened_at: Set(None),
            reopen_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match model.insert(&self.db).await {
            Ok(inserted) => {
                info!(period = %inserted.name, "accounting period created");
                Ok(to_period(inserted))
            }
            Err(e) if violates_unique(&e, YEAR_MONTH_CONSTRAINT) => self
                .find_by_year_month(year, month_key)
                .await?
                .map(to_period)
                .ok_or_else(|| PeriodError::Database(e.to_string())),
            Err(e) => Err(database(e)),
        }
    }

    async fn find_by_year_month(
        &self,
        year: i32,
        month: i32,
    ) -> Result<Option<accounting_periods::Model>, PeriodError> {
        accounting_periods::Entity::find()
            .filter(accounting_periods::Column::Year.eq(year))
            .filter(accounting_periods::Column::Month.eq(month))
            .one(&self.db)
            .await
            .map_err(database)
    }

    /// Gets a period by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the period does not exist.
    pub async fn get_period(
        &self,
        id: AccountingPeriodId,
    ) -> Result<AccountingPeriod, PeriodError> {
        accounting_periods::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(database)?
            .map(to_period)
            .ok_or(PeriodError::NotFound(id))
    }

    /// Closes a period.
    ///
    /// The period row is locked for the whole check-and-flip, so no state
    /// changes unless every check passes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The period is already closed
    /// - A draft entry is dated inside the period
    /// - The trial balance as of the period end is not balanced
    /// - The trial balance calculator fails
    pub async fn close_period(
        &self,
        id: AccountingPeriodId,
        actor: UserId,
        notes: Option<String>,
    ) -> Result<AccountingPeriod, PeriodError> {
        let txn = self.db.begin().await.map_err(database)?;
        let model = lock_period(&txn, id).await?;
        let mut period = to_period(model.clone());

        ClosingGate::ensure_open(&period)?;

        let drafts = count_drafts_in_range(&txn, period.start_date, period.end_date)
            .await
            .map_err(database)?;
        ClosingGate::ensure_no_drafts(&period, drafts).inspect_err(|_| {
            warn!(period = %period.name, drafts, "close refused: draft entries in range");
        })?;

        let trial_balance = self
            .trial_balance
            .trial_balance(period.end_date)
            .await
            .inspect_err(|e| error!(period = %period.name, error = %e, "trial balance failed"))?;
        ClosingGate::ensure_trial_balance(&period, &trial_balance).inspect_err(|_| {
            warn!(
                period = %period.name,
                difference = %trial_balance.difference,
                "close refused: trial balance is off"
            );
        })?;

        ClosingGate::close(&mut period, actor, notes);

        let mut active: accounting_periods::ActiveModel = model.into();
        active.is_closed = Set(true);
        active.closed_by = Set(period.closed_by.map(UserId::into_inner));
        active.closed_at = Set(period.closed_at.map(Into::into));
        active.closing_notes = Set(period.closing_notes.clone());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await.map_err(database)?;

        txn.commit().await.map_err(database)?;

        info!(period = %period.name, %actor, "accounting period closed");
        self.audit.publish(
            AuditRecord::new(AuditAction::PeriodClosed, "accounting_period", id.into_inner())
                .by(actor)
                .severity(Severity::Critical)
                .before(json!({"is_closed": false}))
                .after(json!({
                    "is_closed": true,
                    "notes": period.closing_notes,
                    "total_debit": trial_balance.total_debit,
                    "total_credit": trial_balance.total_credit,
                })),
        );

        Ok(period)
    }

    /// Reopens a closed period, recording who reopened it and why.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is not closed or the reason is blank.
    pub async fn reopen_period(
        &self,
        id: AccountingPeriodId,
        actor: UserId,
        reason: String,
    ) -> Result<AccountingPeriod, PeriodError> {
        let txn = self.db.begin().await.map_err(database)?;
        let model = lock_period(&txn, id).await?;
        let mut period = to_period(model.clone());

        ClosingGate::check_reopen(&period, &reason)?;
        ClosingGate::reopen(&mut period, actor, reason);

        let mut active: accounting_periods::ActiveModel = model.into();
        active.is_closed = Set(false);
        active.closed_by = Set(None);
        active.closed_at = Set(None);
        active.reopened_by = Set(period.reopened_by.map(UserId::into_inner));
        active.reopened_at = Set(period.reopened_at.map(Into::into));
        active.reopen_reason = Set(period.reopen_reason.clone());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await.map_err(database)?;

        txn.commit().await.map_err(database)?;

        info!(period = %period.name, %actor, "accounting period reopened");
        self.audit.publish(
            AuditRecord::new(AuditAction::PeriodReopened, "accounting_period", id.into_inner())
                .by(actor)
                .severity(Severity::Critical)
                .before(json!({"is_closed": true}))
                .after(json!({"is_closed": false, "reason": period.reopen_reason})),
        );

        Ok(period)
    }

    /// Returns true if `date` falls inside a closed period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_date_in_closed_period(&self, date: NaiveDate) -> Result<bool, PeriodError> {
        let periods = covering_periods(&self.db, date, false)
            .await
            .map_err(database)?;
        Ok(is_date_frozen(&periods, date))
    }

    /// The period containing `date`, if one has been created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_period_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<AccountingPeriod>, PeriodError> {
        let periods = covering_periods(&self.db, date, false)
            .await
            .map_err(database)?;
        Ok(periods.into_iter().next())
    }
}

/// Periods whose range contains `date`, optionally share-locked.
pub(crate) async fn covering_periods<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
    lock: bool,
) -> Result<Vec<AccountingPeriod>, DbErr> {
    let mut query = accounting_periods::Entity::find()
        .filter(accounting_periods::Column::StartDate.lte(date))
        .filter(accounting_periods::Column::EndDate.gte(date))
        .order_by_asc(accounting_periods::Column::StartDate);
    if lock {
        query = query.lock_shared();
    }

    let rows = query.all(conn).await?;
    Ok(rows.into_iter().map(to_period).collect())
}

async fn lock_period<C: ConnectionTrait>(
    conn: &C,
    id: AccountingPeriodId,
) -> Result<accounting_periods::Model, PeriodError> {
    accounting_periods::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(database)?
        .ok_or(PeriodError::NotFound(id))
}

fn database(err: DbErr) -> PeriodError {
    PeriodError::Database(err.to_string())
}

fn to_period(model: accounting_periods::Model) -> AccountingPeriod {
    AccountingPeriod {
        id: AccountingPeriodId::from_uuid(model.id),
        year: model.year,
        month: model.month.unsigned_abs(),
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
        is_closed: model.is_closed,
        closed_by: model.closed_by.map(UserId::from_uuid),
        closed_at: model.closed_at.map(|t| t.with_timezone(&Utc)),
        closing_notes: model.closing_notes,
        reopened_by: model.reopened_by.map(UserId::from_uuid),
        reopened_at: model.reopened_at.map(|t| t.with_timezone(&Utc)),
        reopen_reason: model.reopen_reason,
    }
}
