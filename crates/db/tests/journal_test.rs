//! Integration tests for the journal repository.
//!
//! Run with a PostgreSQL database at `DATABASE_URL`:
//! `cargo test -p bursar-db -- --ignored`

mod common;

use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};

use bursar_core::accounts::AccountType;
use bursar_core::journal::{
    EntryStatus, Expense, ExpenseStatus, JournalError, LineInput, PaymentEvent, PayrollStatus,
    PayrollTransaction, ReferenceType,
};
use bursar_db::entities::journal_entry_lines;
use bursar_db::{AccountRepository, JournalRepository, ManualEntryInput};
use bursar_shared::AccountingConfig;
use bursar_shared::types::{ExpenseId, LedgerPaymentId, PayrollId, UserId};

async fn repository() -> (sea_orm::DatabaseConnection, JournalRepository) {
    let db = common::setup().await;
    let config = AccountingConfig::default();
    common::ensure_accounts(&db, &config).await;
    let repo = JournalRepository::new(db.clone(), config, common::audit());
    (db, repo)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn approved_expense(year: i32, amount: Decimal) -> Expense {
    Expense {
        id: ExpenseId::new(),
        category: "Utilities".to_string(),
        amount,
        expense_date: date(year, 3, 10),
        description: "Electric bill".to_string(),
        status: ExpenseStatus::Approved,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_unbalanced_manual_entry_rejected() {
    let (db, repo) = repository().await;
    let year = common::scratch_year();
    let a = common::scratch_account(&db, AccountType::Asset).await;
    let b = common::scratch_account(&db, AccountType::Revenue).await;

    let result = repo
        .create_manual_entry(ManualEntryInput {
            entry_date: date(year, 1, 15),
            description: "Unbalanced".to_string(),
            lines: vec![
                LineInput::debit(a.id, dec!(500)),
                LineInput::credit(b.id, dec!(300)),
            ],
            created_by: UserId::new(),
            notes: None,
        })
        .await;

    assert!(matches!(
        result,
        Err(JournalError::Unbalanced { difference, .. }) if difference == dec!(200)
    ));
    assert_eq!(
        repo.count_drafts_in_range(date(year, 1, 1), date(year, 12, 31))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_sub_cent_amounts_rejected() {
    let (db, repo) = repository().await;
    let year = common::scratch_year();
    let a = common::scratch_account(&db, AccountType::Asset).await;
    let b = common::scratch_account(&db, AccountType::Revenue).await;

    let manual = repo
        .create_manual_entry(ManualEntryInput {
            entry_date: date(year, 3, 1),
            description: "Fractional".to_string(),
            lines: vec![
                LineInput::debit(a.id, dec!(100.004)),
                LineInput::credit(b.id, dec!(100.004)),
            ],
            created_by: UserId::new(),
            notes: None,
        })
        .await;
    assert!(matches!(manual, Err(JournalError::ExcessPrecision(_))));

    let expense = repo
        .post_expense_entry(&approved_expense(year, dec!(10.005)), UserId::new(), None)
        .await;
    assert!(matches!(expense, Err(JournalError::ExcessPrecision(_))));

    assert_eq!(
        repo.count_drafts_in_range(date(year, 1, 1), date(year, 12, 31))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_manual_entry_approval_posts_to_balances() {
    let (db, repo) = repository().await;
    let year = common::scratch_year();
    let cash = common::scratch_account(&db, AccountType::Asset).await;
    let revenue = common::scratch_account(&db, AccountType::Revenue).await;
    let accounts = AccountRepository::new(db.clone());

    let draft = repo
        .create_manual_entry(ManualEntryInput {
            entry_date: date(year, 2, 1),
            description: "Donation received".to_string(),
            lines: vec![
                LineInput::debit(cash.id, dec!(1200)),
                LineInput::credit(revenue.id, dec!(1200)),
            ],
            created_by: UserId::new(),
            notes: Some("Parents association".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(draft.entry.status, EntryStatus::Draft);
    assert_eq!(draft.entry.entry_number, format!("JE-{year}-001"));
    assert_eq!(
        draft.entry.description,
        "Donation received | Notes: Parents association"
    );
    assert_eq!(draft.lines.len(), 2);

    // Drafts do not count toward balances.
    assert_eq!(accounts.get_balance(cash.id, None).await.unwrap(), Decimal::ZERO);

    let pending = repo.list_pending_entries().await.unwrap();
    let listed = pending
        .iter()
        .find(|p| p.entry.id == draft.entry.id)
        .expect("draft is pending");
    assert_eq!(listed.total_debit, dec!(1200));
    assert_eq!(listed.lines[0].account_code, cash.code);

    let approver = UserId::new();
    let posted = repo
        .approve_entry(draft.entry.id, approver, Some("ok".to_string()))
        .await
        .unwrap();
    assert_eq!(posted.status, EntryStatus::Posted);
    assert_eq!(posted.approved_by, Some(approver));
    assert!(posted.approved_at.is_some());
    assert!(posted.description.ends_with(" | Approval notes: ok"));

    assert_eq!(accounts.get_balance(cash.id, None).await.unwrap(), dec!(1200));
    assert_eq!(accounts.get_balance(revenue.id, None).await.unwrap(), dec!(1200));
    assert_eq!(
        accounts
            .get_balance(cash.id, Some(date(year, 1, 31)))
            .await
            .unwrap(),
        Decimal::ZERO
    );

    let again = repo.approve_entry(draft.entry.id, approver, None).await;
    assert!(matches!(again, Err(JournalError::InvalidTransition { .. })));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_reject_requires_reason_and_is_terminal() {
    let (db, repo) = repository().await;
    let year = common::scratch_year();
    let a = common::scratch_account(&db, AccountType::Expense).await;
    let b = common::scratch_account(&db, AccountType::Asset).await;

    let draft = repo
        .create_manual_entry(ManualEntryInput {
            entry_date: date(year, 4, 2),
            description: "Petty cash".to_string(),
            lines: vec![
                LineInput::debit(a.id, dec!(75.50)),
                LineInput::credit(b.id, dec!(75.50)),
            ],
            created_by: UserId::new(),
            notes: None,
        })
        .await
        .unwrap();

    let blank = repo.reject_entry(draft.entry.id, UserId::new(), "  ".to_string()).await;
    assert!(matches!(blank, Err(JournalError::RejectionReasonRequired)));

    let rejected = repo
        .reject_entry(draft.entry.id, UserId::new(), "No receipt".to_string())
        .await
        .unwrap();
    assert_eq!(rejected.status, EntryStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("No receipt"));

    let approve = repo.approve_entry(draft.entry.id, UserId::new(), None).await;
    assert!(matches!(approve, Err(JournalError::InvalidTransition { .. })));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_inactive_account_rejected() {
    let (db, repo) = repository().await;
    let year = common::scratch_year();
    let a = common::scratch_account(&db, AccountType::Asset).await;
    let b = common::scratch_account(&db, AccountType::Revenue).await;
    AccountRepository::new(db.clone())
        .deactivate_account(b.id)
        .await
        .unwrap();

    let result = repo
        .create_manual_entry(ManualEntryInput {
            entry_date: date(year, 5, 5),
            description: "To inactive".to_string(),
            lines: vec![
                LineInput::debit(a.id, dec!(10)),
                LineInput::credit(b.id, dec!(10)),
            ],
            created_by: UserId::new(),
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(JournalError::AccountInactive(id)) if id == b.id));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_payment_posting_debits_cash() {
    let (_db, repo) = repository().await;
    let year = common::scratch_year();

    let outcome = repo
        .post_payment_entry(
            &PaymentEvent {
                payment_id: LedgerPaymentId::new(),
                amount: dec!(10000),
                payment_date: date(year, 6, 1),
                or_number: common::or_number("OR"),
            },
            UserId::new(),
        )
        .await
        .unwrap();
    assert!(outcome.created);

    let posted = repo.get_entry(outcome.entry_id).await.unwrap();
    assert_eq!(posted.entry.status, EntryStatus::Posted);
    assert_eq!(posted.entry.reference_type, ReferenceType::Payment);
    assert!(posted.entry.approved_at.is_some());
    let debit: Decimal = posted.lines.iter().map(|l| l.debit).sum();
    let credit: Decimal = posted.lines.iter().map(|l| l.credit).sum();
    assert_eq!(debit, dec!(10000));
    assert_eq!(credit, dec!(10000));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_expense_posting_is_idempotent() {
    let (_db, repo) = repository().await;
    let year = common::scratch_year();
    let expense = approved_expense(year, dec!(4500));

    let first = repo
        .post_expense_entry(&expense, UserId::new(), None)
        .await
        .unwrap();
    let second = repo
        .post_expense_entry(&expense, UserId::new(), None)
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.entry_id, second.entry_id);

    let pending = Expense {
        status: ExpenseStatus::Pending,
        ..approved_expense(year, dec!(10))
    };
    assert!(matches!(
        repo.post_expense_entry(&pending, UserId::new(), None).await,
        Err(JournalError::ExpenseNotApproved(_))
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_expense_posting_creates_one_entry() {
    let (_db, repo) = repository().await;
    let year = common::scratch_year();
    let expense = approved_expense(year, dec!(999));

    let results = join_all((0..4).map(|_| {
        let repo = repo.clone();
        let expense = expense.clone();
        async move { repo.post_expense_entry(&expense, UserId::new(), None).await }
    }))
    .await;

    let outcomes: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(outcomes.iter().filter(|o| o.created).count(), 1);
    assert!(outcomes.iter().all(|o| o.entry_id == outcomes[0].entry_id));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_entry_numbers_are_sequential_per_year() {
    let (_db, repo) = repository().await;
    let year = common::scratch_year();

    let results = join_all((0..5).map(|_| {
        let repo = repo.clone();
        async move {
            repo.post_expense_entry(&approved_expense(year, dec!(100)), UserId::new(), None)
                .await
        }
    }))
    .await;

    let mut numbers: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().entry_number)
        .collect();
    numbers.sort();
    let expected: Vec<String> = (1..=5).map(|n| format!("JE-{year}-{n:03}")).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_payroll_postings() {
    let (_db, repo) = repository().await;
    let year = common::scratch_year();
    let payroll = |gross: Decimal| PayrollTransaction {
        id: PayrollId::new(),
        employee_name: "J. Santos".to_string(),
        pay_date: date(year, 7, 15),
        gross_pay: gross,
        net_pay: gross - dec!(1500),
        employee_deductions: dec!(1500),
        employer_contributions: dec!(800),
        status: PayrollStatus::Paid,
    };

    let single = payroll(dec!(20000));
    let outcome = repo
        .post_payroll_entry(&single, UserId::new(), None)
        .await
        .unwrap();
    let entry = repo.get_entry(outcome.entry_id).await.unwrap();
    assert_eq!(entry.entry.reference_type, ReferenceType::Payroll);
    let debit: Decimal = entry.lines.iter().map(|l| l.debit).sum();
    assert_eq!(debit, dec!(20800));

    let batch = vec![payroll(dec!(18000)), payroll(dec!(22000))];
    let outcome = repo
        .post_batch_payroll_entry(&batch, UserId::new(), Some(UserId::new()))
        .await
        .unwrap();
    assert!(outcome.created);
    let again = repo
        .post_batch_payroll_entry(&batch, UserId::new(), None)
        .await
        .unwrap();
    assert!(!again.created);

    assert!(matches!(
        repo.post_batch_payroll_entry(&[], UserId::new(), None).await,
        Err(JournalError::EmptyPayrollBatch)
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_posted_lines_are_immutable() {
    let (db, repo) = repository().await;
    let year = common::scratch_year();
    let outcome = repo
        .post_expense_entry(&approved_expense(year, dec!(300)), UserId::new(), None)
        .await
        .unwrap();
    let entry = repo.get_entry(outcome.entry_id).await.unwrap();

    let line = journal_entry_lines::Entity::find_by_id(entry.lines[0].id.into_inner())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let extra = journal_entry_lines::ActiveModel {
        id: Set(uuid::Uuid::now_v7()),
        entry_id: Set(line.entry_id),
        line_number: Set(99),
        account_id: Set(line.account_id),
        debit: Set(dec!(5000)),
        credit: Set(Decimal::ZERO),
        description: Set(None),
    };
    assert!(extra.insert(&db).await.is_err());

    let mut active: journal_entry_lines::ActiveModel = line.clone().into();
    active.debit = Set(dec!(1));
    assert!(active.update(&db).await.is_err());

    assert!(
        journal_entry_lines::Entity::delete_by_id(line.id)
            .exec(&db)
            .await
            .is_err()
    );

    let unchanged = repo.get_entry(outcome.entry_id).await.unwrap();
    assert_eq!(unchanged.lines.len(), 2);
    assert_eq!(unchanged.entry.status, EntryStatus::Posted);
}
