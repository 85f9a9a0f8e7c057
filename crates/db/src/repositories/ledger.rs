//! Student ledger repository.
//!
//! Every mutation locks the ledger row (`SELECT … FOR UPDATE`), loads its
//! charges and payments into a [`LedgerBook`], applies the change there, and
//! writes the new row plus the recalculated totals before committing. The
//! cached totals are therefore never observed out of step with the rows.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use bursar_core::audit::{AuditAction, AuditRecord};
use bursar_core::billing::{
    BillingError, ChargeType, GradeLevel, LedgerBook, LedgerCharge, LedgerPayment, NewPayment,
    StudentLedger,
};
use bursar_core::ports::{DiscountConfigStore, FeeScheduleProvider, SchoolYearResolver};
use bursar_shared::types::{
    DiscountId, LedgerChargeId, LedgerPaymentId, StudentId, StudentLedgerId, UserId,
    is_whole_cents,
};

use super::violates_unique;
use crate::audit::AuditOutbox;
use crate::entities::{
    ledger_charges, ledger_payments, official_receipts, payment_logs, student_ledgers,
};

const DISCOUNT_CONSTRAINT: &str = "uq_ledger_charges_discount";
const RECEIPT_CONSTRAINTS: [&str; 3] = [
    "official_receipts_pkey",
    "uq_ledger_payments_or_number",
    "uq_payment_logs_or_number",
];

const RECEIPT_SOURCE_LEDGER: &str = "ledger";
const RECEIPT_SOURCE_LEGACY: &str = "legacy";

/// A payment recorded in the legacy payment log rather than a ledger.
#[derive(Debug, Clone)]
pub struct LegacyPayment {
    /// Student who paid.
    pub student_id: StudentId,
    /// Positive amount.
    pub amount: Decimal,
    /// Official receipt number.
    pub or_number: String,
}

/// Student ledger repository.
#[derive(Clone)]
pub struct StudentLedgerRepository {
    db: DatabaseConnection,
    fee_schedules: Arc<dyn FeeScheduleProvider>,
    discounts: Arc<dyn DiscountConfigStore>,
    school_years: Arc<dyn SchoolYearResolver>,
    audit: AuditOutbox,
}

impl StudentLedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        fee_schedules: Arc<dyn FeeScheduleProvider>,
        discounts: Arc<dyn DiscountConfigStore>,
        school_years: Arc<dyn SchoolYearResolver>,
        audit: AuditOutbox,
    ) -> Self {
        Self {
            db,
            fee_schedules,
            discounts,
            school_years,
            audit,
        }
    }

    /// Gets the student's ledger for the open school year, creating it and
    /// populating its initial charges when needed.
    ///
    /// An existing ledger without charges is populated again, so calling this
    /// twice yields one set of initial charges. A missing grade level is
    /// back-filled from `grade_level`.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenSchoolYear` if no school year is open.
    pub async fn get_or_create_for_current_year(
        &self,
        student_id: StudentId,
        grade_level: Option<GradeLevel>,
    ) -> Result<LedgerBook, BillingError> {
        let school_year = self
            .school_years
            .active_school_year()
            .await?
            .ok_or(BillingError::NoOpenSchoolYear)?;

        let txn = self.db.begin().await.map_err(database)?;

        let ledger_id = match find_id_for_student(&txn, student_id, &school_year).await? {
            Some(id) => id,
            None => insert_ledger(&txn, student_id, &school_year, grade_level).await?,
        };

        let (model, mut book) = load_book(&txn, ledger_id).await?;
        backfill_grade(&mut book, grade_level);
        let added = self.populate_if_configured(&mut book).await?;

        persist_charges(&txn, &added).await?;
        save_totals(&txn, model, &book.ledger).await?;
        txn.commit().await.map_err(database)?;

        if !added.is_empty() {
            info!(
                ledger_id = %book.ledger.id,
                %school_year,
                total_charges = %book.ledger.total_charges,
                "initial charges populated"
            );
        }
        Ok(book)
    }

    /// Populates tuition, misc and other charges from the grade's fee
    /// schedule. A ledger that already has charges is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ledger does not exist
    /// - The ledger has no grade level and none is supplied
    /// - No fee schedule is configured for the grade
    pub async fn populate_initial_charges(
        &self,
        ledger_id: StudentLedgerId,
        grade_level: Option<GradeLevel>,
    ) -> Result<Vec<LedgerCharge>, BillingError> {
        let txn = self.db.begin().await.map_err(database)?;
        let (model, mut book) = load_book(&txn, ledger_id).await?;
        backfill_grade(&mut book, grade_level);

        let added = self.populate(&mut book).await?;

        persist_charges(&txn, &added).await?;
        save_totals(&txn, model, &book.ledger).await?;
        txn.commit().await.map_err(database)?;

        Ok(added)
    }

    async fn populate(&self, book: &mut LedgerBook) -> Result<Vec<LedgerCharge>, BillingError> {
        if !book.needs_initial_charges() {
            return Ok(Vec::new());
        }
        let grade = book
            .ledger
            .grade_level
            .ok_or(BillingError::GradeLevelRequired(book.ledger.id))?;
        let schedule = self
            .fee_schedules
            .fee_schedule(grade)
            .await?
            .ok_or(BillingError::FeeScheduleNotFound(grade))?;

        let population = book.populate_initial_charges(&schedule);
        if let Some(mismatch) = population.mismatch {
            warn!(
                ledger_id = %book.ledger.id,
                %grade,
                schedule_total = %schedule.total(),
                %mismatch,
                "populated charges do not match fee schedule total"
            );
        }
        Ok(population.added)
    }

    /// Like [`Self::populate`], but a missing grade or fee schedule only
    /// warns. Used on the read and create paths.
    async fn populate_if_configured(
        &self,
        book: &mut LedgerBook,
    ) -> Result<Vec<LedgerCharge>, BillingError> {
        match self.populate(book).await {
            Err(
                e @ (BillingError::GradeLevelRequired(_) | BillingError::FeeScheduleNotFound(_)),
            ) => {
                warn!(ledger_id = %book.ledger.id, reason = %e, "initial charges not populated");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Recomputes totals and status from the charge and payment rows.
    ///
    /// # Errors
    ///
    /// Returns `LedgerNotFound` if the ledger does not exist.
    pub async fn recalculate_totals(
        &self,
        ledger_id: StudentLedgerId,
    ) -> Result<StudentLedger, BillingError> {
        let txn = self.db.begin().await.map_err(database)?;
        let (model, mut book) = load_book(&txn, ledger_id).await?;
        book.recalculate();
        save_totals(&txn, model, &book.ledger).await?;
        txn.commit().await.map_err(database)?;
        Ok(book.ledger)
    }

    /// Applies a discount as a negative charge.
    ///
    /// `label` names the discount kind and is the memo when no description is
    /// given. A configured discount (`discount_id`) applies at most once per
    /// ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive or the discount is
    /// already applied.
    pub async fn apply_discount(
        &self,
        ledger_id: StudentLedgerId,
        label: &str,
        amount: Decimal,
        discount_id: Option<DiscountId>,
        description: Option<String>,
    ) -> Result<LedgerCharge, BillingError> {
        let description = description
            .filter(|d| !d.trim().is_empty())
            .or_else(|| Some(label.to_string()).filter(|l| !l.trim().is_empty()));

        let txn = self.db.begin().await.map_err(database)?;
        let (model, mut book) = load_book(&txn, ledger_id).await?;

        let charge = book.apply_discount(amount, discount_id, description)?;
        self.commit_charge(txn, model, &book, &charge, AuditAction::DiscountApplied)
            .await?;
        Ok(charge)
    }

    /// Applies a configured discount, computing its amount from the
    /// ledger's tuition total.
    ///
    /// # Errors
    ///
    /// Returns an error if the discount is unknown, inactive, already applied,
    /// or computes to a non-positive amount.
    pub async fn apply_configured_discount(
        &self,
        ledger_id: StudentLedgerId,
        discount_id: DiscountId,
    ) -> Result<LedgerCharge, BillingError> {
        let config = self
            .discounts
            .discount(discount_id)
            .await?
            .ok_or(BillingError::DiscountNotFound(discount_id))?;
        if !config.is_active {
            return Err(BillingError::DiscountInactive(config.name));
        }

        let txn = self.db.begin().await.map_err(database)?;
        let (model, mut book) = load_book(&txn, ledger_id).await?;

        let amount = config.compute_amount(book.tuition_total());
        let charge = book.apply_discount(amount, Some(discount_id), Some(config.description()))?;
        self.commit_charge(txn, model, &book, &charge, AuditAction::DiscountApplied)
            .await?;
        Ok(charge)
    }

    /// Adds a positive charge.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive.
    pub async fn add_charge(
        &self,
        ledger_id: StudentLedgerId,
        charge_type: ChargeType,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<LedgerCharge, BillingError> {
        let txn = self.db.begin().await.map_err(database)?;
        let (model, mut book) = load_book(&txn, ledger_id).await?;

        let charge = book.add_charge(charge_type, amount, description)?;
        let action = if charge.charge_type == ChargeType::Discount {
            AuditAction::DiscountApplied
        } else {
            AuditAction::ChargeAdded
        };
        self.commit_charge(txn, model, &book, &charge, action).await?;
        Ok(charge)
    }

    async fn commit_charge(
        &self,
        txn: sea_orm::DatabaseTransaction,
        model: student_ledgers::Model,
        book: &LedgerBook,
        charge: &LedgerCharge,
        action: AuditAction,
    ) -> Result<(), BillingError> {
        persist_charges(&txn, std::slice::from_ref(charge)).await?;
        save_totals(&txn, model, &book.ledger).await?;
        txn.commit().await.map_err(database)?;

        info!(
            ledger_id = %book.ledger.id,
            charge_type = %charge.charge_type,
            amount = %charge.amount,
            balance = %book.ledger.balance,
            "ledger charge recorded"
        );
        self.audit.publish(
            AuditRecord::new(action, "student_ledger", book.ledger.id.into_inner()).after(json!({
                "charge_id": charge.id.into_inner(),
                "charge_type": charge.charge_type.as_str(),
                "amount": charge.amount,
                "total_charges": book.ledger.total_charges,
                "balance": book.ledger.balance,
            })),
        );
        Ok(())
    }

    /// Records a payment against the live balance.
    ///
    /// The OR number is registered in the receipt register inside the same
    /// transaction, so it can never be reused by a ledger or legacy payment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive or the OR number is blank
    /// - The OR number has been used before
    /// - The amount exceeds the live balance
    pub async fn add_payment(
        &self,
        ledger_id: StudentLedgerId,
        payment: NewPayment,
    ) -> Result<LedgerPayment, BillingError> {
        let txn = self.db.begin().await.map_err(database)?;
        let (model, mut book) = load_book(&txn, ledger_id).await?;

        book.check_payment(&payment)?;
        let or_number = payment.or_number.trim().to_string();
        if or_number_taken(&txn, &or_number).await? {
            return Err(BillingError::DuplicateOrNumber(or_number));
        }

        let row = book.add_payment(payment)?;
        register_receipt(&txn, &row.or_number, RECEIPT_SOURCE_LEDGER, row.id.into_inner()).await?;
        ledger_payments::ActiveModel {
            id: Set(row.id.into_inner()),
            ledger_id: Set(row.ledger_id.into_inner()),
            amount: Set(row.amount),
            or_number: Set(row.or_number.clone()),
            method: Set(row.method.into()),
            processed_by: Set(row.processed_by.map(UserId::into_inner)),
            paid_at: Set(row.paid_at.into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| receipt_error(e, &row.or_number))?;

        save_totals(&txn, model, &book.ledger).await?;
        txn.commit().await.map_err(database)?;

        info!(
            %ledger_id,
            or_number = %row.or_number,
            amount = %row.amount,
            balance = %book.ledger.balance,
            status = %book.ledger.status,
            "payment recorded"
        );
        let mut record = AuditRecord::new(
            AuditAction::PaymentRecorded,
            "student_ledger",
            ledger_id.into_inner(),
        )
        .after(json!({
            "payment_id": row.id.into_inner(),
            "or_number": row.or_number,
            "amount": row.amount,
            "balance": book.ledger.balance,
            "status": book.ledger.status.as_str(),
        }));
        if let Some(processor) = row.processed_by {
            record = record.by(processor);
        }
        self.audit.publish(record);

        Ok(row)
    }

    /// Records a payment in the legacy payment log.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive or not in whole cents,
    /// the OR number is blank, or the OR number has been used before.
    pub async fn log_legacy_payment(&self, payment: LegacyPayment) -> Result<Uuid, BillingError> {
        if payment.amount <= Decimal::ZERO {
            return Err(BillingError::NonPositiveAmount(payment.amount));
        }
        if !is_whole_cents(payment.amount) {
            return Err(BillingError::ExcessPrecision(payment.amount));
        }
        let or_number = payment.or_number.trim().to_string();
        if or_number.is_empty() {
            return Err(BillingError::OrNumberRequired);
        }

        let txn = self.db.begin().await.map_err(database)?;
        if or_number_taken(&txn, &or_number).await? {
            return Err(BillingError::DuplicateOrNumber(or_number));
        }

        let id = LedgerPaymentId::new().into_inner();
        register_receipt(&txn, &or_number, RECEIPT_SOURCE_LEGACY, id).await?;
        payment_logs::ActiveModel {
            id: Set(id),
            student_id: Set(payment.student_id.into_inner()),
            amount: Set(payment.amount),
            or_number: Set(or_number.clone()),
            paid_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| receipt_error(e, &or_number))?;
        txn.commit().await.map_err(database)?;

        info!(
            student_id = %payment.student_id,
            %or_number,
            amount = %payment.amount,
            "legacy payment logged"
        );
        Ok(id)
    }

    /// Gets a ledger by id after repairing missing charges and stale totals.
    ///
    /// # Errors
    ///
    /// Returns `LedgerNotFound` if the ledger does not exist.
    pub async fn get_ledger(&self, ledger_id: StudentLedgerId) -> Result<LedgerBook, BillingError> {
        self.ensure_consistent(ledger_id).await
    }

    /// Gets the student's ledger for `school_year` after repairing it.
    ///
    /// # Errors
    ///
    /// Returns `LedgerNotFoundForStudent` if the student has no ledger for the
    /// year.
    pub async fn get_ledger_for_student(
        &self,
        student_id: StudentId,
        school_year: &str,
    ) -> Result<LedgerBook, BillingError> {
        let ledger_id = find_id_for_student(&self.db, student_id, school_year)
            .await?
            .ok_or_else(|| BillingError::LedgerNotFoundForStudent {
                student_id,
                school_year: school_year.to_string(),
            })?;
        self.ensure_consistent(ledger_id).await
    }

    /// Repairs a ledger in place: populates initial charges if it has none
    /// and rewrites totals that disagree with the rows.
    ///
    /// Reads can therefore write; callers always observe a consistent
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LedgerNotFound` if the ledger does not exist.
    pub async fn ensure_consistent(
        &self,
        ledger_id: StudentLedgerId,
    ) -> Result<LedgerBook, BillingError> {
        let txn = self.db.begin().await.map_err(database)?;
        let (model, mut book) = load_book(&txn, ledger_id).await.inspect_err(|e| {
            error!(%ledger_id, error = %e, "ledger retrieval failed");
        })?;

        let added = self.populate_if_configured(&mut book).await?;
        let stale = book.is_stale();
        if added.is_empty() && !stale {
            return Ok(book);
        }

        if stale {
            warn!(
                %ledger_id,
                cached_balance = %book.ledger.balance,
                live_balance = %book.live_balance(),
                "stale ledger totals repaired"
            );
            book.recalculate();
        }
        persist_charges(&txn, &added).await?;
        save_totals(&txn, model, &book.ledger).await?;
        txn.commit().await.map_err(database)?;

        Ok(book)
    }

    /// Most recent ledger before `excluding_year` that still has a balance,
    /// for carry-forward billing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_previous_balance_ledger(
        &self,
        student_id: StudentId,
        excluding_year: &str,
    ) -> Result<Option<StudentLedger>, BillingError> {
        let model = student_ledgers::Entity::find()
            .filter(student_ledgers::Column::StudentId.eq(student_id.into_inner()))
            .filter(student_ledgers::Column::SchoolYear.lt(excluding_year))
            .filter(student_ledgers::Column::Balance.gt(Decimal::ZERO))
            .order_by_desc(student_ledgers::Column::SchoolYear)
            .one(&self.db)
            .await
            .map_err(database)?;

        Ok(model.map(to_ledger))
    }

    /// All ledgers with an outstanding balance, largest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn aging_report(&self) -> Result<Vec<StudentLedger>, BillingError> {
        let rows = student_ledgers::Entity::find()
            .filter(student_ledgers::Column::Balance.gt(Decimal::ZERO))
            .order_by_desc(student_ledgers::Column::Balance)
            .order_by_asc(student_ledgers::Column::SchoolYear)
            .all(&self.db)
            .await
            .map_err(database)?;

        Ok(rows.into_iter().map(to_ledger).collect())
    }
}

fn backfill_grade(book: &mut LedgerBook, grade_level: Option<GradeLevel>) {
    if book.ledger.grade_level.is_none()
        && let Some(grade) = grade_level
    {
        info!(ledger_id = %book.ledger.id, %grade, "grade level back-filled");
        book.ledger.grade_level = Some(grade);
    }
}

async fn find_id_for_student<C: ConnectionTrait>(
    conn: &C,
    student_id: StudentId,
    school_year: &str,
) -> Result<Option<StudentLedgerId>, BillingError> {
    let id: Option<Uuid> = student_ledgers::Entity::find()
        .filter(student_ledgers::Column::StudentId.eq(student_id.into_inner()))
        .filter(student_ledgers::Column::SchoolYear.eq(school_year))
        .select_only()
        .column(student_ledgers::Column::Id)
        .into_tuple()
        .one(conn)
        .await
        .map_err(database)?;

    Ok(id.map(StudentLedgerId::from_uuid))
}

/// Inserts an empty ledger, or returns the one a concurrent caller created.
///
/// `ON CONFLICT DO NOTHING` keeps the surrounding transaction usable when
/// the insert loses the race on the (student, school year) key.
async fn insert_ledger<C: ConnectionTrait>(
    conn: &C,
    student_id: StudentId,
    school_year: &str,
    grade_level: Option<GradeLevel>,
) -> Result<StudentLedgerId, BillingError> {
    let ledger = StudentLedger::open(student_id, school_year.to_string(), grade_level);
    let model = student_ledgers::ActiveModel {
        id: Set(ledger.id.into_inner()),
        student_id: Set(student_id.into_inner()),
        school_year: Set(ledger.school_year.clone()),
        grade_level: Set(grade_level.map(GradeLevel::code)),
        total_charges: Set(ledger.total_charges),
        total_payments: Set(ledger.total_payments),
        balance: Set(ledger.balance),
        status: Set(ledger.status.into()),
        created_at: Set(ledger.created_at.into()),
        updated_at: Set(ledger.updated_at.into()),
    };

    let inserted = student_ledgers::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                student_ledgers::Column::StudentId,
                student_ledgers::Column::SchoolYear,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .map_err(database)?;

    if inserted == 1 {
        info!(ledger_id = %ledger.id, %student_id, school_year, "student ledger created");
        return Ok(ledger.id);
    }
    find_id_for_student(conn, student_id, school_year)
        .await?
        .ok_or_else(|| BillingError::Database("ledger vanished after insert conflict".to_string()))
}

/// Locks the ledger row and loads its charges and payments.
async fn load_book<C: ConnectionTrait>(
    conn: &C,
    ledger_id: StudentLedgerId,
) -> Result<(student_ledgers::Model, LedgerBook), BillingError> {
    let model = student_ledgers::Entity::find_by_id(ledger_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(database)?
        .ok_or(BillingError::LedgerNotFound(ledger_id))?;

    let charges = ledger_charges::Entity::find()
        .filter(ledger_charges::Column::LedgerId.eq(model.id))
        .order_by_asc(ledger_charges::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(database)?;
    let payments = ledger_payments::Entity::find()
        .filter(ledger_payments::Column::LedgerId.eq(model.id))
        .order_by_asc(ledger_payments::Column::PaidAt)
        .all(conn)
        .await
        .map_err(database)?;

    let book = LedgerBook::new(
        to_ledger(model.clone()),
        charges.into_iter().map(to_charge).collect(),
        payments.into_iter().map(to_payment).collect(),
    );
    Ok((model, book))
}

async fn persist_charges<C: ConnectionTrait>(
    conn: &C,
    charges: &[LedgerCharge],
) -> Result<(), BillingError> {
    for charge in charges {
        ledger_charges::ActiveModel {
            id: Set(charge.id.into_inner()),
            ledger_id: Set(charge.ledger_id.into_inner()),
            charge_type: Set(charge.charge_type.into()),
            amount: Set(charge.amount),
            description: Set(charge.description.clone()),
            discount_id: Set(charge.discount_id.map(DiscountId::into_inner)),
            created_at: Set(charge.created_at.into()),
        }
        .insert(conn)
        .await
        .map_err(|e| match charge.discount_id {
            Some(discount_id) if violates_unique(&e, DISCOUNT_CONSTRAINT) => {
                BillingError::DuplicateDiscount {
                    ledger_id: charge.ledger_id,
                    discount_id,
                }
            }
            _ => database(e),
        })?;
    }
    Ok(())
}

/// Writes the book's cached totals, status and grade level.
async fn save_totals<C: ConnectionTrait>(
    conn: &C,
    model: student_ledgers::Model,
    ledger: &StudentLedger,
) -> Result<(), BillingError> {
    let mut active: student_ledgers::ActiveModel = model.into();
    active.grade_level = Set(ledger.grade_level.map(GradeLevel::code));
    active.total_charges = Set(ledger.total_charges);
    active.total_payments = Set(ledger.total_payments);
    active.balance = Set(ledger.balance);
    active.status = Set(ledger.status.into());
    active.updated_at = Set(ledger.updated_at.into());
    active.update(conn).await.map_err(database)?;
    Ok(())
}

async fn or_number_taken<C: ConnectionTrait>(
    conn: &C,
    or_number: &str,
) -> Result<bool, BillingError> {
    let registered = official_receipts::Entity::find_by_id(or_number.to_string())
        .one(conn)
        .await
        .map_err(database)?
        .is_some();
    if registered {
        return Ok(true);
    }

    let in_ledgers = ledger_payments::Entity::find()
        .filter(ledger_payments::Column::OrNumber.eq(or_number))
        .count(conn)
        .await
        .map_err(database)?;
    let in_legacy_log = payment_logs::Entity::find()
        .filter(payment_logs::Column::OrNumber.eq(or_number))
        .count(conn)
        .await
        .map_err(database)?;

    Ok(in_ledgers + in_legacy_log > 0)
}

async fn register_receipt<C: ConnectionTrait>(
    conn: &C,
    or_number: &str,
    source: &str,
    payment_id: Uuid,
) -> Result<(), BillingError> {
    official_receipts::ActiveModel {
        or_number: Set(or_number.to_string()),
        source: Set(source.to_string()),
        payment_id: Set(payment_id),
        issued_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(|e| receipt_error(e, or_number))?;
    Ok(())
}

fn receipt_error(err: DbErr, or_number: &str) -> BillingError {
    if RECEIPT_CONSTRAINTS
        .iter()
        .any(|constraint| violates_unique(&err, constraint))
    {
        BillingError::DuplicateOrNumber(or_number.to_string())
    } else {
        database(err)
    }
}

fn database(err: DbErr) -> BillingError {
    BillingError::Database(err.to_string())
}

fn to_ledger(model: student_ledgers::Model) -> StudentLedger {
    StudentLedger {
        id: StudentLedgerId::from_uuid(model.id),
        student_id: StudentId::from_uuid(model.student_id),
        school_year: model.school_year,
        grade_level: model.grade_level.and_then(GradeLevel::from_code),
        total_charges: model.total_charges,
        total_payments: model.total_payments,
        balance: model.balance,
        status: model.status.into(),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn to_charge(model: ledger_charges::Model) -> LedgerCharge {
    LedgerCharge {
        id: LedgerChargeId::from_uuid(model.id),
        ledger_id: StudentLedgerId::from_uuid(model.ledger_id),
        charge_type: model.charge_type.into(),
        amount: model.amount,
        description: model.description,
        discount_id: model.discount_id.map(DiscountId::from_uuid),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn to_payment(model: ledger_payments::Model) -> LedgerPayment {
    LedgerPayment {
        id: LedgerPaymentId::from_uuid(model.id),
        ledger_id: StudentLedgerId::from_uuid(model.ledger_id),
        amount: model.amount,
        or_number: model.or_number,
        method: model.method.into(),
        processed_by: model.processed_by.map(UserId::from_uuid),
        paid_at: model.paid_at.with_timezone(&Utc),
    }
}
