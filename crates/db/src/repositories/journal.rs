//! Journal entry repository.
//!
//! System postings (payment, expense, payroll) are written and flipped to
//! `Posted` in one transaction; manual entries start as `Draft` and go through
//! [`EntryWorkflow`]. Every write runs in one transaction that also checks
//! the accounting period covering the entry date.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait,
};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use bursar_core::accounts::Account;
use bursar_core::audit::{AuditAction, AuditRecord, Severity};
use bursar_core::journal::{
    EntryTotals, EntryWithLines, EntryWorkflow, Expense, JournalEntry, JournalError, JournalLine,
    LineInput, PaymentEvent, PayrollTransaction, PendingEntry, PostingTemplate, ReferenceType,
    ReviewLine, WorkflowAction, ensure_balanced, expense_posting, format_entry_number,
    next_sequence, payment_posting, payroll_batch_posting, payroll_posting,
    validate_line_accounts, validate_manual_lines, year_prefix,
};
use bursar_core::period::is_date_frozen;
use bursar_shared::AccountingConfig;
use bursar_shared::types::{AccountId, JournalEntryId, JournalLineId, UserId};

use super::account::to_account;
use super::period::covering_periods;
use super::violates_unique;
use crate::audit::AuditOutbox;
use crate::entities::{
    accounts, journal_entries, journal_entry_lines, journal_entry_sequences,
    sea_orm_active_enums::{JournalEntryStatus, JournalReferenceType},
};

const ENTRY_NUMBER_CONSTRAINT: &str = "uq_journal_entries_entry_number";
const REFERENCE_CONSTRAINT: &str = "uq_journal_entries_reference";

const NEXT_SEQUENCE_SQL: &str = r"
INSERT INTO journal_entry_sequences (year, last_value)
VALUES ($1, $2)
ON CONFLICT (year) DO UPDATE SET last_value = journal_entry_sequences.last_value + 1
RETURNING last_value
";

/// Result of a system posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingOutcome {
    /// Entry carrying the posting.
    pub entry_id: JournalEntryId,
    /// Its entry number.
    pub entry_number: String,
    /// False when an entry for the same expense or payroll already existed.
    pub created: bool,
}

/// Input for a manual journal entry.
#[derive(Debug, Clone)]
pub struct ManualEntryInput {
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Description.
    pub description: String,
    /// At least two balanced lines.
    pub lines: Vec<LineInput>,
    /// Creator.
    pub created_by: UserId,
    /// Optional notes appended to the description.
    pub notes: Option<String>,
}

/// Journal entry repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    accounting: AccountingConfig,
    audit: AuditOutbox,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        accounting: AccountingConfig,
        audit: AuditOutbox,
    ) -> Self {
        Self {
            db,
            accounting,
            audit,
        }
    }

    /// Posts Debit Cash / Credit Tuition Revenue for a student payment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive
    /// - The cash or revenue account is missing
    /// - The payment date falls in a closed period
    pub async fn post_payment_entry(
        &self,
        payment: &PaymentEvent,
        actor: UserId,
    ) -> Result<PostingOutcome, JournalError> {
        let template = payment_posting(payment, &self.accounting)?;
        self.post_template(template, actor, None, AuditAction::PaymentPosted)
            .await
    }

    /// Posts an approved expense. Posting the same expense twice returns the
    /// existing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is not approved, an account is
    /// missing, or the expense date falls in a closed period.
    pub async fn post_expense_entry(
        &self,
        expense: &Expense,
        actor: UserId,
        approver: Option<UserId>,
    ) -> Result<PostingOutcome, JournalError> {
        let template = expense_posting(expense, &self.accounting)?;
        self.post_template(template, actor, approver, AuditAction::ExpensePosted)
            .await
    }

    /// Posts one paid payroll transaction. Idempotent per transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is not paid, an account is
    /// missing, or the pay date falls in a closed period.
    pub async fn post_payroll_entry(
        &self,
        payroll: &PayrollTransaction,
        actor: UserId,
        approver: Option<UserId>,
    ) -> Result<PostingOutcome, JournalError> {
        let template = payroll_posting(payroll, &self.accounting)?;
        self.post_template(template, actor, approver, AuditAction::PayrollPosted)
            .await
    }

    /// Posts one aggregated entry for a batch of paid payroll transactions.
    ///
    /// The batch is keyed by its first transaction, so resubmitting it
    /// returns the existing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is empty, any transaction is not paid,
    /// an account is missing, or the pay date falls in a closed period.
    pub async fn post_batch_payroll_entry(
        &self,
        transactions: &[PayrollTransaction],
        actor: UserId,
        approver: Option<UserId>,
    ) -> Result<PostingOutcome, JournalError> {
        let template = payroll_batch_posting(transactions, &self.accounting)?;
        self.post_template(template, actor, approver, AuditAction::PayrollPosted)
            .await
    }

    async fn post_template(
        &self,
        template: PostingTemplate,
        actor: UserId,
        approver: Option<UserId>,
        action: AuditAction,
    ) -> Result<PostingOutcome, JournalError> {
        ensure_balanced(template.totals(), self.accounting.balance_tolerance)?;

        let reference_type = template.reference_type;
        let reference_id = template.reference_id;
        let idempotent = is_idempotent(reference_type);

        let txn = self.db.begin().await.map_err(database)?;

        if idempotent
            && let Some(existing) = find_by_reference(&txn, reference_type, reference_id).await?
        {
            info!(
                entry_number = %existing.entry_number,
                %reference_type,
                %reference_id,
                "posting already exists"
            );
            return Ok(PostingOutcome {
                entry_id: JournalEntryId::from_uuid(existing.id),
                entry_number: existing.entry_number,
                created: false,
            });
        }

        ensure_date_open(&txn, template.entry_date).await?;
        let account_ids = self.resolve_template_accounts(&txn, &template).await?;

        let entry_number = allocate_entry_number(&txn, template.entry_date.year()).await?;
        let now = Utc::now();
        let header = journal_entries::ActiveModel {
            id: Set(JournalEntryId::new().into_inner()),
            entry_number: Set(entry_number.clone()),
            entry_date: Set(template.entry_date),
            description: Set(template.description.clone()),
            reference_type: Set(reference_type.into()),
            reference_id: Set(Some(reference_id)),
            // Flipped to Posted after the lines so the deferred balance check runs.
            status: Set(JournalEntryStatus::Draft),
            created_by: Set(actor.into_inner()),
            approved_by: Set(Some(approver.unwrap_or(actor).into_inner())),
            approved_at: Set(Some(now.into())),
            rejected_by: Set(None),
            rejected_at: Set(None),
            rejection_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let inserted = match header.insert(&txn).await {
            Ok(model) => model,
            Err(e) if idempotent && violates_unique(&e, REFERENCE_CONSTRAINT) => {
                drop(txn);
                return self.existing_posting(reference_type, reference_id).await;
            }
            Err(e) => return Err(map_insert_error(e, &entry_number)),
        };

        let lines: Vec<LineRow> = template
            .lines
            .iter()
            .zip(account_ids)
            .map(|(line, account_id)| LineRow {
                account_id,
                debit: line.debit,
                credit: line.credit,
                description: line.description.clone(),
            })
            .collect();
        let entry_id = inserted.id;
        insert_lines(&txn, entry_id, &lines).await?;

        let mut posted: journal_entries::ActiveModel = inserted.into();
        posted.status = Set(JournalEntryStatus::Posted);
        posted.update(&txn).await.map_err(database)?;

        txn.commit().await.map_err(|e| {
            error!(%entry_number, error = %e, "failed to commit posting");
            database(e)
        })?;

        let totals = template.totals();
        info!(
            %entry_number,
            %reference_type,
            %reference_id,
            amount = %totals.debit,
            "journal entry posted"
        );
        self.audit.publish(
            AuditRecord::new(action, "journal_entry", entry_id)
                .by(actor)
                .after(json!({
                    "entry_number": entry_number,
                    "status": "posted",
                    "reference_type": reference_type.to_string(),
                    "reference_id": reference_id,
                    "amount": totals.debit,
                })),
        );

        Ok(PostingOutcome {
            entry_id: JournalEntryId::from_uuid(entry_id),
            entry_number,
            created: true,
        })
    }

    /// Loses a race on the reference index: return the winner's entry.
    async fn existing_posting(
        &self,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> Result<PostingOutcome, JournalError> {
        let existing = find_by_reference(&self.db, reference_type, reference_id)
            .await?
            .ok_or(JournalError::DuplicateReference {
                reference_type,
                reference_id,
            })?;

        Ok(PostingOutcome {
            entry_id: JournalEntryId::from_uuid(existing.id),
            entry_number: existing.entry_number,
            created: false,
        })
    }

    /// Resolves each template line's chart code to an account id, in order.
    async fn resolve_template_accounts<C: ConnectionTrait>(
        &self,
        conn: &C,
        template: &PostingTemplate,
    ) -> Result<Vec<Uuid>, JournalError> {
        let codes: HashSet<&str> = template
            .lines
            .iter()
            .map(|l| l.account_code.as_str())
            .collect();

        let rows = accounts::Entity::find()
            .filter(accounts::Column::Code.is_in(codes.iter().copied()))
            .all(conn)
            .await
            .map_err(|e| {
                error!(error = %e, "chart of accounts lookup failed");
                database(e)
            })?;
        let by_code: HashMap<&str, &accounts::Model> =
            rows.iter().map(|a| (a.code.as_str(), a)).collect();

        template
            .lines
            .iter()
            .map(|line| {
                let code = line.account_code.as_str();
                match by_code.get(code) {
                    Some(account) if account.is_active => Ok(account.id),
                    Some(account) => Err(JournalError::AccountInactive(AccountId::from_uuid(
                        account.id,
                    ))),
                    None => {
                        let role = self.account_role(code);
                        error!(role, account_code = code, "required account is not configured");
                        Err(JournalError::MissingAccount {
                            role,
                            code: code.to_string(),
                        })
                    }
                }
            })
            .collect()
    }

    fn account_role(&self, code: &str) -> &'static str {
        let accounts = &self.accounting;
        if code == accounts.cash {
            "cash"
        } else if code == accounts.tuition_revenue {
            "tuition revenue"
        } else if code == accounts.salaries_expense {
            "salaries expense"
        } else if code == accounts.accrued_payroll_taxes {
            "accrued payroll taxes"
        } else {
            "expense"
        }
    }

    /// Creates a balanced manual entry in `Draft` status.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The description is blank
    /// - Fewer than 2 lines, negative amounts, or debits != credits
    /// - Any account is missing or inactive
    /// - The entry date falls in a closed period
    pub async fn create_manual_entry(
        &self,
        input: ManualEntryInput,
    ) -> Result<EntryWithLines, JournalError> {
        if input.description.trim().is_empty() {
            return Err(JournalError::DescriptionRequired);
        }
        let totals = validate_manual_lines(&input.lines, self.accounting.balance_tolerance)?;

        let txn = self.db.begin().await.map_err(database)?;
        ensure_date_open(&txn, input.entry_date).await?;

        let known = load_accounts(&txn, input.lines.iter().map(|l| l.account_id)).await?;
        validate_line_accounts(&input.lines, |id| known.get(&id))?;

        let entry_number = allocate_entry_number(&txn, input.entry_date.year()).await?;
        let now = Utc::now();
        let header = journal_entries::ActiveModel {
            id: Set(JournalEntryId::new().into_inner()),
            entry_number: Set(entry_number.clone()),
            entry_date: Set(input.entry_date),
            description: Set(with_notes(input.description.trim(), input.notes.as_deref())),
            reference_type: Set(JournalReferenceType::Manual),
            reference_id: Set(None),
            status: Set(JournalEntryStatus::Draft),
            created_by: Set(input.created_by.into_inner()),
            approved_by: Set(None),
            approved_at: Set(None),
            rejected_by: Set(None),
            rejected_at: Set(None),
            rejection_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let inserted = header
            .insert(&txn)
            .await
            .map_err(|e| map_insert_error(e, &entry_number))?;

        let rows: Vec<LineRow> = input
            .lines
            .iter()
            .map(|line| LineRow {
                account_id: line.account_id.into_inner(),
                debit: line.debit,
                credit: line.credit,
                description: line.description.clone(),
            })
            .collect();
        let lines = insert_lines(&txn, inserted.id, &rows).await?;

        txn.commit().await.map_err(database)?;

        info!(%entry_number, amount = %totals.debit, "manual journal entry drafted");
        self.audit.publish(
            AuditRecord::new(AuditAction::EntryCreated, "journal_entry", inserted.id)
                .by(input.created_by)
                .after(json!({
                    "entry_number": entry_number,
                    "status": "draft",
                    "total_debit": totals.debit,
                    "total_credit": totals.credit,
                })),
        );

        Ok(EntryWithLines {
            entry: to_entry(inserted),
            lines: lines.into_iter().map(to_line).collect(),
        })
    }

    /// Approves a draft entry and posts it.
    ///
    /// The stored lines are re-validated for balance, and non-blank notes are
    /// appended to the description.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The entry does not exist or is not a draft
    /// - The stored lines no longer balance
    /// - The entry date falls in a closed period
    pub async fn approve_entry(
        &self,
        id: JournalEntryId,
        approver: UserId,
        notes: Option<String>,
    ) -> Result<JournalEntry, JournalError> {
        let txn = self.db.begin().await.map_err(database)?;
        let entry = lock_entry(&txn, id).await?;

        let action = EntryWorkflow::approve(entry.status.into(), approver, notes)?;
        let WorkflowAction::Approve {
            new_status,
            approved_by,
            approved_at,
            approval_notes,
        } = action
        else {
            return Err(JournalError::Database("unexpected workflow action".to_string()));
        };

        ensure_date_open(&txn, entry.entry_date).await?;

        let amounts: Vec<(Decimal, Decimal)> = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::EntryId.eq(entry.id))
            .select_only()
            .column(journal_entry_lines::Column::Debit)
            .column(journal_entry_lines::Column::Credit)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(database)?;
        let totals = EntryTotals::from_amounts(amounts);
        ensure_balanced(totals, self.accounting.balance_tolerance)?;

        let description =
            EntryWorkflow::description_with_notes(&entry.description, approval_notes.as_deref());
        let mut active: journal_entries::ActiveModel = entry.into();
        active.status = Set(new_status.into());
        active.approved_by = Set(Some(approved_by.into_inner()));
        active.approved_at = Set(Some(approved_at.into()));
        active.description = Set(description);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(database)?;

        txn.commit().await.map_err(database)?;

        info!(entry_number = %updated.entry_number, %approver, "journal entry approved");
        self.audit.publish(
            AuditRecord::new(AuditAction::EntryApproved, "journal_entry", updated.id)
                .by(approver)
                .severity(Severity::Notice)
                .before(json!({"status": "draft"}))
                .after(json!({"status": "posted", "total_debit": totals.debit})),
        );

        Ok(to_entry(updated))
    }

    /// Rejects a draft entry with a reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist, is not a draft, or the
    /// reason is blank.
    pub async fn reject_entry(
        &self,
        id: JournalEntryId,
        rejecter: UserId,
        reason: String,
    ) -> Result<JournalEntry, JournalError> {
        let txn = self.db.begin().await.map_err(database)?;
        let entry = lock_entry(&txn, id).await?;

        let action = EntryWorkflow::reject(entry.status.into(), rejecter, reason)?;
        let WorkflowAction::Reject {
            new_status,
            rejected_by,
            rejected_at,
            rejection_reason,
        } = action
        else {
            return Err(JournalError::Database("unexpected workflow action".to_string()));
        };

        let mut active: journal_entries::ActiveModel = entry.into();
        active.status = Set(new_status.into());
        active.rejected_by = Set(Some(rejected_by.into_inner()));
        active.rejected_at = Set(Some(rejected_at.into()));
        active.rejection_reason = Set(Some(rejection_reason.clone()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(database)?;

        txn.commit().await.map_err(database)?;

        info!(entry_number = %updated.entry_number, %rejecter, "journal entry rejected");
        self.audit.publish(
            AuditRecord::new(AuditAction::EntryRejected, "journal_entry", updated.id)
                .by(rejecter)
                .severity(Severity::Notice)
                .before(json!({"status": "draft"}))
                .after(json!({"status": "rejected", "reason": rejection_reason})),
        );

        Ok(to_entry(updated))
    }

    /// Gets an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry does not exist.
    pub async fn get_entry(&self, id: JournalEntryId) -> Result<EntryWithLines, JournalError> {
        let entry = journal_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(database)?
            .ok_or(JournalError::EntryNotFound(id))?;

        let lines = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::EntryId.eq(entry.id))
            .order_by_asc(journal_entry_lines::Column::LineNumber)
            .all(&self.db)
            .await
            .map_err(database)?;

        Ok(EntryWithLines {
            entry: to_entry(entry),
            lines: lines.into_iter().map(to_line).collect(),
        })
    }

    /// All draft entries with account codes and names, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_pending_entries(&self) -> Result<Vec<PendingEntry>, JournalError> {
        let drafts = journal_entries::Entity::find()
            .filter(journal_entries::Column::Status.eq(JournalEntryStatus::Draft))
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::EntryNumber)
            .all(&self.db)
            .await
            .map_err(database)?;
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let lines = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::EntryId.is_in(drafts.iter().map(|d| d.id)))
            .order_by_asc(journal_entry_lines::Column::LineNumber)
            .all(&self.db)
            .await
            .map_err(database)?;
        let known = load_accounts(
            &self.db,
            lines.iter().map(|l| AccountId::from_uuid(l.account_id)),
        )
        .await?;

        let mut lines_by_entry: HashMap<Uuid, Vec<ReviewLine>> = HashMap::new();
        for line in lines {
            let account = known.get(&AccountId::from_uuid(line.account_id));
            let review = ReviewLine {
                account_code: account.map(|a| a.code.clone()).unwrap_or_default(),
                account_name: account.map(|a| a.name.clone()).unwrap_or_default(),
                line: to_line(line),
            };
            lines_by_entry
                .entry(review.line.entry_id.into_inner())
                .or_default()
                .push(review);
        }

        Ok(drafts
            .into_iter()
            .map(|draft| {
                let lines = lines_by_entry.remove(&draft.id).unwrap_or_default();
                let totals =
                    EntryTotals::from_amounts(lines.iter().map(|l| (l.line.debit, l.line.credit)));
                PendingEntry {
                    entry: to_entry(draft),
                    lines,
                    total_debit: totals.debit,
                    total_credit: totals.credit,
                }
            })
            .collect())
    }

    /// Number of draft entries dated within `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_drafts_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, JournalError> {
        count_drafts_in_range(&self.db, start, end)
            .await
            .map_err(database)
    }
}

struct LineRow {
    account_id: Uuid,
    debit: Decimal,
    credit: Decimal,
    description: Option<String>,
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    entry_id: Uuid,
    rows: &[LineRow],
) -> Result<Vec<journal_entry_lines::Model>, JournalError> {
    let mut inserted = Vec::with_capacity(rows.len());
    for (line_number, row) in (1..).zip(rows) {
        let line = journal_entry_lines::ActiveModel {
            id: Set(JournalLineId::new().into_inner()),
            entry_id: Set(entry_id),
            line_number: Set(line_number),
            account_id: Set(row.account_id),
            debit: Set(row.debit),
            credit: Set(row.credit),
            description: Set(row.description.clone()),
        };
        inserted.push(line.insert(conn).await.map_err(database)?);
    }
    Ok(inserted)
}

/// Allocates the next `JE-<year>-<seq>` number from the per-year counter.
///
/// The counter is seeded from the highest number already issued for the
/// year the first time the year is used.
async fn allocate_entry_number<C: ConnectionTrait>(
    conn: &C,
    year: i32,
) -> Result<String, JournalError> {
    let counter = journal_entry_sequences::Entity::find_by_id(year)
        .one(conn)
        .await
        .map_err(database)?;

    let seed = if counter.is_some() {
        1
    } else {
        let issued: Vec<String> = journal_entries::Entity::find()
            .filter(journal_entries::Column::EntryNumber.starts_with(year_prefix(year)))
            .select_only()
            .column(journal_entries::Column::EntryNumber)
            .into_tuple()
            .all(conn)
            .await
            .map_err(database)?;
        next_sequence(year, issued.iter().map(String::as_str))
    };

    let row = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            NEXT_SEQUENCE_SQL,
            [year.into(), seed.into()],
        ))
        .await
        .map_err(database)?
        .ok_or_else(|| JournalError::Database("entry sequence returned no row".to_string()))?;
    let sequence: i64 = row.try_get("", "last_value").map_err(database)?;

    Ok(format_entry_number(year, sequence))
}

/// Fails with `PeriodClosed` if `date` lies in a closed period.
///
/// Covering periods are share-locked so a concurrent close waits for this
/// transaction.
async fn ensure_date_open<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
) -> Result<(), JournalError> {
    let periods = covering_periods(conn, date, true).await.map_err(database)?;
    if is_date_frozen(&periods, date) {
        warn!(%date, "posting rejected: period is closed");
        return Err(JournalError::PeriodClosed(date));
    }
    Ok(())
}

pub(crate) async fn count_drafts_in_range<C: ConnectionTrait>(
    conn: &C,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<u64, DbErr> {
    journal_entries::Entity::find()
        .filter(journal_entries::Column::Status.eq(JournalEntryStatus::Draft))
        .filter(journal_entries::Column::EntryDate.between(start, end))
        .count(conn)
        .await
}

async fn find_by_reference<C: ConnectionTrait>(
    conn: &C,
    reference_type: ReferenceType,
    reference_id: Uuid,
) -> Result<Option<journal_entries::Model>, JournalError> {
    journal_entries::Entity::find()
        .filter(
            journal_entries::Column::ReferenceType.eq(JournalReferenceType::from(reference_type)),
        )
        .filter(journal_entries::Column::ReferenceId.eq(reference_id))
        .filter(journal_entries::Column::Status.ne(JournalEntryStatus::Rejected))
        .one(conn)
        .await
        .map_err(database)
}

async fn lock_entry<C: ConnectionTrait>(
    conn: &C,
    id: JournalEntryId,
) -> Result<journal_entries::Model, JournalError> {
    journal_entries::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(database)?
        .ok_or(JournalError::EntryNotFound(id))
}

async fn load_accounts<C, I>(conn: &C, ids: I) -> Result<HashMap<AccountId, Account>, JournalError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = AccountId>,
{
    let ids: HashSet<Uuid> = ids.into_iter().map(AccountId::into_inner).collect();
    let rows = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids))
        .all(conn)
        .await
        .map_err(|e| {
            error!(error = %e, "chart of accounts lookup failed");
            database(e)
        })?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let account = to_account(row);
            (account.id, account)
        })
        .collect())
}

fn is_idempotent(reference_type: ReferenceType) -> bool {
    matches!(reference_type, ReferenceType::Expense | ReferenceType::Payroll)
}

fn with_notes(description: &str, notes: Option<&str>) -> String {
    match notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(notes) => format!("{description} | Notes: {notes}"),
        None => description.to_string(),
    }
}

fn map_insert_error(err: DbErr, entry_number: &str) -> JournalError {
    if violates_unique(&err, ENTRY_NUMBER_CONSTRAINT) {
        JournalError::DuplicateEntryNumber(entry_number.to_string())
    } else {
        database(err)
    }
}

fn database(err: DbErr) -> JournalError {
    JournalError::Database(err.to_string())
}

fn to_entry(model: journal_entries::Model) -> JournalEntry {
    JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        entry_number: model.entry_number,
        entry_date: model.entry_date,
        description: model.description,
        reference_type: model.reference_type.into(),
        reference_id: model.reference_id,
        status: model.status.into(),
        created_by: UserId::from_uuid(model.created_by),
        approved_by: model.approved_by.map(UserId::from_uuid),
        approved_at: model.approved_at.map(|t| t.with_timezone(&Utc)),
        rejected_by: model.rejected_by.map(UserId::from_uuid),
        rejection_reason: model.rejection_reason,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn to_line(model: journal_entry_lines::Model) -> JournalLine {
    JournalLine {
        id: JournalLineId::from_uuid(model.id),
        entry_id: JournalEntryId::from_uuid(model.entry_id),
        line_number: model.line_number,
        account_id: AccountId::from_uuid(model.account_id),
        debit: model.debit,
        credit: model.credit,
        description: model.description,
    }
}
