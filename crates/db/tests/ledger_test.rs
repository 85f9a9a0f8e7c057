//! Integration tests for the student ledger repository.
//!
//! Run with a PostgreSQL database at `DATABASE_URL`:
//! `cargo test -p bursar-db -- --ignored`

mod common;

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use bursar_core::billing::{
    BillingError, ChargeType, DiscountConfig, DiscountRate, FeeSchedule, GradeLevel, LedgerStatus,
    NewPayment, PaymentMethod,
};
use bursar_core::ports::{FixedSchoolYear, StaticDiscounts, StaticFeeSchedules};
use bursar_db::entities::{ledger_charges, student_ledgers};
use bursar_db::{LegacyPayment, StudentLedgerRepository};
use bursar_shared::types::{DiscountId, StudentId, UserId};

fn grade3_schedule() -> FeeSchedule {
    FeeSchedule {
        grade_level: GradeLevel::Grade3,
        tuition: dec!(22000),
        misc: dec!(8000),
        other: dec!(3500),
    }
}

fn sibling_discount(id: DiscountId) -> DiscountConfig {
    DiscountConfig {
        id,
        name: "Sibling Discount".to_string(),
        rate: DiscountRate::Percentage(dec!(10)),
        min_amount: None,
        max_amount: None,
        is_active: true,
    }
}

fn repository(
    db: &sea_orm::DatabaseConnection,
    school_year: &str,
    discounts: Vec<DiscountConfig>,
) -> StudentLedgerRepository {
    StudentLedgerRepository::new(
        db.clone(),
        Arc::new(StaticFeeSchedules::new([grade3_schedule()])),
        Arc::new(StaticDiscounts::new(discounts)),
        Arc::new(FixedSchoolYear(Some(school_year.to_string()))),
        common::audit(),
    )
}

fn payment(amount: Decimal, or_number: &str) -> NewPayment {
    NewPayment {
        amount,
        or_number: or_number.to_string(),
        method: PaymentMethod::Cash,
        processed_by: Some(UserId::new()),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_grade3_payment_lifecycle() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let repo = repository(&db, &school_year, vec![]);

    let book = repo
        .get_or_create_for_current_year(StudentId::new(), Some(GradeLevel::Grade3))
        .await
        .unwrap();
    let ledger_id = book.ledger.id;
    assert_eq!(book.charges.len(), 3);
    assert_eq!(book.ledger.total_charges, dec!(33500));
    assert_eq!(book.ledger.balance, dec!(33500));
    assert_eq!(book.ledger.status, LedgerStatus::Unpaid);

    repo.add_payment(ledger_id, payment(dec!(10000), &common::or_number("OR-0001")))
        .await
        .unwrap();
    let ledger = repo.get_ledger(ledger_id).await.unwrap().ledger;
    assert_eq!(ledger.balance, dec!(23500));
    assert_eq!(ledger.status, LedgerStatus::PartiallyPaid);

    repo.add_payment(ledger_id, payment(dec!(23500), &common::or_number("OR-0002")))
        .await
        .unwrap();
    let ledger = repo.get_ledger(ledger_id).await.unwrap().ledger;
    assert_eq!(ledger.balance, Decimal::ZERO);
    assert_eq!(ledger.status, LedgerStatus::FullyPaid);

    let overpay = repo
        .add_payment(ledger_id, payment(dec!(1), &common::or_number("OR-0003")))
        .await;
    assert!(matches!(
        overpay,
        Err(BillingError::PaymentExceedsBalance { balance, .. }) if balance.is_zero()
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_sub_cent_amounts_rejected_and_stored_totals_match_rows() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let repo = repository(&db, &school_year, vec![]);
    let student = StudentId::new();
    let ledger_id = repo
        .get_or_create_for_current_year(student, Some(GradeLevel::Grade3))
        .await
        .unwrap()
        .ledger
        .id;

    let payment = repo
        .add_payment(ledger_id, payment(dec!(9.995), &common::or_number("OR-CENT")))
        .await;
    assert!(matches!(payment, Err(BillingError::ExcessPrecision(_))));

    let discount = repo
        .apply_discount(ledger_id, "Rounding", dec!(0.005), None, None)
        .await;
    assert!(matches!(discount, Err(BillingError::ExcessPrecision(_))));

    let charge = repo
        .add_charge(ledger_id, ChargeType::Adjustment, dec!(0.004), None)
        .await;
    assert!(matches!(charge, Err(BillingError::ExcessPrecision(_))));

    let legacy = repo
        .log_legacy_payment(LegacyPayment {
            student_id: student,
            amount: dec!(1.001),
            or_number: common::or_number("OR-CENT-LEGACY"),
        })
        .await;
    assert!(matches!(legacy, Err(BillingError::ExcessPrecision(_))));

    repo.add_charge(ledger_id, ChargeType::Adjustment, dec!(12.50), None)
        .await
        .unwrap();

    let stored = student_ledgers::Entity::find_by_id(ledger_id.into_inner())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let rows: Decimal = ledger_charges::Entity::find()
        .filter(ledger_charges::Column::LedgerId.eq(ledger_id.into_inner()))
        .all(&db)
        .await
        .unwrap()
        .iter()
        .map(|c| c.amount)
        .sum();
    assert_eq!(rows, dec!(33512.50));
    assert_eq!(stored.total_charges, rows);
    assert_eq!(stored.balance, rows);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_get_or_create_is_idempotent() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let repo = repository(&db, &school_year, vec![]);
    let student = StudentId::new();

    let first = repo
        .get_or_create_for_current_year(student, Some(GradeLevel::Grade3))
        .await
        .unwrap();
    let second = repo
        .get_or_create_for_current_year(student, Some(GradeLevel::Grade3))
        .await
        .unwrap();

    assert_eq!(first.ledger.id, second.ledger.id);
    assert_eq!(second.charges.len(), 3);
    assert_eq!(second.ledger.total_charges, dec!(33500));

    let added = repo
        .populate_initial_charges(first.ledger.id, None)
        .await
        .unwrap();
    assert!(added.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_get_or_create_yields_one_ledger() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let repo = repository(&db, &school_year, vec![]);
    let student = StudentId::new();

    let results = join_all((0..5).map(|_| {
        let repo = repo.clone();
        async move {
            repo.get_or_create_for_current_year(student, Some(GradeLevel::Grade3))
                .await
        }
    }))
    .await;

    let ids: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap().ledger.id)
        .collect();
    assert!(ids.iter().all(|id| *id == ids[0]));

    let book = repo.get_ledger(ids[0]).await.unwrap();
    assert_eq!(book.charges.len(), 3);
    assert_eq!(book.ledger.total_charges, dec!(33500));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_missing_grade_skips_population_until_backfilled() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let repo = repository(&db, &school_year, vec![]);
    let student = StudentId::new();

    let book = repo
        .get_or_create_for_current_year(student, None)
        .await
        .unwrap();
    assert!(book.charges.is_empty());
    assert!(matches!(
        repo.populate_initial_charges(book.ledger.id, None).await,
        Err(BillingError::GradeLevelRequired(_))
    ));

    let book = repo
        .get_or_create_for_current_year(student, Some(GradeLevel::Grade3))
        .await
        .unwrap();
    assert_eq!(book.ledger.grade_level, Some(GradeLevel::Grade3));
    assert_eq!(book.charges.len(), 3);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_no_open_school_year() {
    let db = common::setup().await;
    let repo = StudentLedgerRepository::new(
        db.clone(),
        Arc::new(StaticFeeSchedules::new([grade3_schedule()])),
        Arc::new(StaticDiscounts::default()),
        Arc::new(FixedSchoolYear(None)),
        common::audit(),
    );

    let result = repo
        .get_or_create_for_current_year(StudentId::new(), Some(GradeLevel::Grade3))
        .await;
    assert!(matches!(result, Err(BillingError::NoOpenSchoolYear)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_configured_discount_applies_once() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let discount_id = DiscountId::new();
    let repo = repository(&db, &school_year, vec![sibling_discount(discount_id)]);

    let book = repo
        .get_or_create_for_current_year(StudentId::new(), Some(GradeLevel::Grade3))
        .await
        .unwrap();
    let ledger_id = book.ledger.id;

    let charge = repo
        .apply_configured_discount(ledger_id, discount_id)
        .await
        .unwrap();
    assert_eq!(charge.charge_type, ChargeType::Discount);
    assert_eq!(charge.amount, dec!(-2200));
    assert_eq!(charge.description.as_deref(), Some("Sibling Discount (10%)"));

    let again = repo.apply_configured_discount(ledger_id, discount_id).await;
    assert!(matches!(again, Err(BillingError::DuplicateDiscount { .. })));

    let ledger = repo.get_ledger(ledger_id).await.unwrap().ledger;
    assert_eq!(ledger.total_charges, dec!(31300));
    assert_eq!(ledger.balance, dec!(31300));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_unknown_and_inactive_discounts() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let inactive_id = DiscountId::new();
    let inactive = DiscountConfig {
        is_active: false,
        ..sibling_discount(inactive_id)
    };
    let repo = repository(&db, &school_year, vec![inactive]);

    let ledger_id = repo
        .get_or_create_for_current_year(StudentId::new(), Some(GradeLevel::Grade3))
        .await
        .unwrap()
        .ledger
        .id;

    assert!(matches!(
        repo.apply_configured_discount(ledger_id, DiscountId::new()).await,
        Err(BillingError::DiscountNotFound(_))
    ));
    assert!(matches!(
        repo.apply_configured_discount(ledger_id, inactive_id).await,
        Err(BillingError::DiscountInactive(_))
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_manual_discount_and_charge() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let repo = repository(&db, &school_year, vec![]);

    let ledger_id = repo
        .get_or_create_for_current_year(StudentId::new(), Some(GradeLevel::Grade3))
        .await
        .unwrap()
        .ledger
        .id;

    let discount = repo
        .apply_discount(ledger_id, "Scholarship", dec!(1500), None, None)
        .await
        .unwrap();
    assert_eq!(discount.amount, dec!(-1500));
    assert_eq!(discount.description.as_deref(), Some("Scholarship"));

    repo.add_charge(
        ledger_id,
        ChargeType::Adjustment,
        dec!(250),
        Some("Lab fee".to_string()),
    )
    .await
    .unwrap();

    assert!(matches!(
        repo.add_charge(ledger_id, ChargeType::Adjustment, dec!(-5), None)
            .await,
        Err(BillingError::NonPositiveAmount(_))
    ));

    let ledger = repo.recalculate_totals(ledger_id).await.unwrap();
    assert_eq!(ledger.total_charges, dec!(32250));
    assert_eq!(ledger.balance, dec!(32250));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_or_number_unique_across_stores() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let repo = repository(&db, &school_year, vec![]);

    let ledger_id = repo
        .get_or_create_for_current_year(StudentId::new(), Some(GradeLevel::Grade3))
        .await
        .unwrap()
        .ledger
        .id;

    let legacy_or = common::or_number("LEGACY");
    repo.log_legacy_payment(LegacyPayment {
        student_id: StudentId::new(),
        amount: dec!(500),
        or_number: legacy_or.clone(),
    })
    .await
    .unwrap();

    let reused = repo.add_payment(ledger_id, payment(dec!(100), &legacy_or)).await;
    assert!(matches!(reused, Err(BillingError::DuplicateOrNumber(or)) if or == legacy_or));

    let ledger_or = common::or_number("OR");
    repo.add_payment(ledger_id, payment(dec!(100), &ledger_or))
        .await
        .unwrap();
    let reused = repo.add_payment(ledger_id, payment(dec!(100), &ledger_or)).await;
    assert!(matches!(reused, Err(BillingError::DuplicateOrNumber(_))));

    let legacy_reuse = repo
        .log_legacy_payment(LegacyPayment {
            student_id: StudentId::new(),
            amount: dec!(50),
            or_number: ledger_or,
        })
        .await;
    assert!(matches!(legacy_reuse, Err(BillingError::DuplicateOrNumber(_))));

    let ledger = repo.get_ledger(ledger_id).await.unwrap().ledger;
    assert_eq!(ledger.total_payments, dec!(100));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_payments_never_overpay() {
    let db = common::setup().await;
    let school_year = common::scratch_school_year();
    let repo = repository(&db, &school_year, vec![]);

    let ledger_id = repo
        .get_or_create_for_current_year(StudentId::new(), Some(GradeLevel::Grade3))
        .await
        .unwrap()
        .ledger
        .id;

    // Four payments of 10000 against a 33500 balance: exactly three fit.
    let results = join_all((0..4).map(|i| {
        let repo = repo.clone();
        let or = common::or_number(&format!("OR-C{i}"));
        async move { repo.add_payment(ledger_id, payment(dec!(10000), &or)).await }
    }))
    .await;

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 3);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(BillingError::PaymentExceedsBalance { .. })
    )));

    let ledger = repo.get_ledger(ledger_id).await.unwrap().ledger;
    assert_eq!(ledger.total_payments, dec!(30000));
    assert_eq!(ledger.balance, dec!(3500));
    assert_eq!(ledger.status, LedgerStatus::PartiallyPaid);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_previous_balance_and_aging() {
    let db = common::setup().await;
    let student = StudentId::new();
    let base = common::scratch_year();
    let earlier = format!("{}-{}", base, base + 1);
    let later = format!("{}-{}", base + 1, base + 2);

    let old_repo = repository(&db, &earlier, vec![]);
    let old = old_repo
        .get_or_create_for_current_year(student, Some(GradeLevel::Grade3))
        .await
        .unwrap();
    let new_repo = repository(&db, &later, vec![]);
    new_repo
        .get_or_create_for_current_year(student, Some(GradeLevel::Grade3))
        .await
        .unwrap();

    let previous = new_repo
        .get_previous_balance_ledger(student, &later)
        .await
        .unwrap()
        .expect("earlier ledger carries a balance");
    assert_eq!(previous.id, old.ledger.id);
    assert!(
        new_repo
            .get_previous_balance_ledger(student, &earlier)
            .await
            .unwrap()
            .is_none()
    );

    let aging = new_repo.aging_report().await.unwrap();
    assert!(aging.iter().any(|l| l.id == old.ledger.id));
    assert!(aging.windows(2).all(|w| w[0].balance >= w[1].balance));

    assert!(matches!(
        new_repo.get_ledger_for_student(StudentId::new(), &later).await,
        Err(BillingError::LedgerNotFoundForStudent { .. })
    ));
    let found = new_repo
        .get_ledger_for_student(student, &earlier)
        .await
        .unwrap();
    assert_eq!(found.ledger.id, old.ledger.id);
}
