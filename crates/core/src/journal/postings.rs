//! System-generated postings for payments, expenses and payroll.
//!
//! Builders return a [`PostingTemplate`] addressed by well-known chart codes.
//! Storage resolves the codes, allocates an entry number and posts the entry
//! in the same transaction.

use bursar_shared::AccountingConfig;
use bursar_shared::types::{ExpenseId, LedgerPaymentId, PayrollId, is_whole_cents};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::JournalError;
use super::types::{CodedLine, PostingTemplate, ReferenceType};
use super::validation::ensure_balanced;

/// A student payment that has been accepted by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Payment row id, used as the entry reference.
    pub payment_id: LedgerPaymentId,
    /// Amount received.
    pub amount: Decimal,
    /// Date the money was received.
    pub payment_date: NaiveDate,
    /// Official receipt number.
    pub or_number: String,
}

/// Expense approval state, owned by the expense module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Awaiting approval.
    Pending,
    /// Approved and ready to journalize.
    Approved,
    /// Refused.
    Rejected,
}

/// An expense to journalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Expense id, used as the entry reference.
    pub id: ExpenseId,
    /// Free-text category, mapped to an expense account by keyword.
    pub category: String,
    /// Amount spent.
    pub amount: Decimal,
    /// Date incurred.
    pub expense_date: NaiveDate,
    /// What the money was spent on.
    pub description: String,
    /// Approval state.
    pub status: ExpenseStatus,
}

/// Payroll transaction state, owned by the payroll module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayrollStatus {
    /// Computed but not released.
    Pending,
    /// Released to the employee.
    Paid,
    /// Voided.
    Cancelled,
}

/// One employee's pay for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollTransaction {
    /// Transaction id.
    pub id: PayrollId,
    /// Employee display name, used in descriptions.
    pub employee_name: String,
    /// Pay date.
    pub pay_date: NaiveDate,
    /// Gross pay.
    pub gross_pay: Decimal,
    /// Amount released to the employee.
    pub net_pay: Decimal,
    /// Withholdings taken from gross pay.
    pub employee_deductions: Decimal,
    /// Employer share of statutory contributions.
    pub employer_contributions: Decimal,
    /// Payment state.
    pub status: PayrollStatus,
}

/// Expense account keywords, checked in order against the lowercased category.
const EXPENSE_KEYWORDS: [(&str, ExpenseAccount); 6] = [
    ("salary", ExpenseAccount::Salaries),
    ("utilit", ExpenseAccount::Utilities),
    ("suppl", ExpenseAccount::Supplies),
    ("rent", ExpenseAccount::Rent),
    ("maintenance", ExpenseAccount::Maintenance),
    ("office", ExpenseAccount::Office),
];

#[derive(Debug, Clone, Copy)]
enum ExpenseAccount {
    Salaries,
    Utilities,
    Supplies,
    Rent,
    Maintenance,
    Office,
}

/// Maps an expense category to its expense account code.
///
/// Matching is by case-insensitive keyword; unmatched categories go to the
/// configured "other expenses" account.
#[must_use]
pub fn expense_account_code<'a>(category: &str, accounts: &'a AccountingConfig) -> &'a str {
    let category = category.to_lowercase();
    let matched = EXPENSE_KEYWORDS
        .iter()
        .find(|(keyword, _)| category.contains(keyword))
        .map(|(_, account)| *account);

    match matched {
        Some(ExpenseAccount::Salaries) => &accounts.salaries_expense,
        Some(ExpenseAccount::Utilities) => &accounts.utilities_expense,
        Some(ExpenseAccount::Supplies) => &accounts.supplies_expense,
        Some(ExpenseAccount::Rent) => &accounts.rent_expense,
        Some(ExpenseAccount::Maintenance) => &accounts.maintenance_expense,
        Some(ExpenseAccount::Office) => &accounts.office_expense,
        None => &accounts.other_expense,
    }
}

/// Debit Cash, credit Tuition Revenue for the payment amount.
pub fn payment_posting(
    payment: &PaymentEvent,
    accounts: &AccountingConfig,
) -> Result<PostingTemplate, JournalError> {
    require_positive(payment.amount)?;

    Ok(PostingTemplate {
        entry_date: payment.payment_date,
        description: format!("Student payment - OR {}", payment.or_number),
        reference_type: ReferenceType::Payment,
        reference_id: payment.payment_id.into_inner(),
        lines: vec![
            debit(&accounts.cash, payment.amount),
            credit(&accounts.tuition_revenue, payment.amount),
        ],
    })
}

/// Debit the mapped expense account, credit Cash.
pub fn expense_posting(
    expense: &Expense,
    accounts: &AccountingConfig,
) -> Result<PostingTemplate, JournalError> {
    if expense.status != ExpenseStatus::Approved {
        return Err(JournalError::ExpenseNotApproved(expense.id));
    }
    require_positive(expense.amount)?;

    Ok(PostingTemplate {
        entry_date: expense.expense_date,
        description: format!("Expense: {}", expense.description),
        reference_type: ReferenceType::Expense,
        reference_id: expense.id.into_inner(),
        lines: vec![
            debit(expense_account_code(&expense.category, accounts), expense.amount),
            credit(&accounts.cash, expense.amount),
        ],
    })
}

/// Payroll posting for one paid transaction.
pub fn payroll_posting(
    payroll: &PayrollTransaction,
    accounts: &AccountingConfig,
) -> Result<PostingTemplate, JournalError> {
    let amounts = PayrollAmounts::of(payroll)?;
    build_payroll(
        payroll.pay_date,
        format!("Payroll - {}", payroll.employee_name),
        payroll.id.into_inner(),
        &amounts,
        accounts,
    )
}

/// One aggregated payroll posting for a batch of paid transactions.
///
/// The first transaction's id is the entry reference, which makes the batch
/// idempotent as long as callers submit it in the same order.
pub fn payroll_batch_posting(
    transactions: &[PayrollTransaction],
    accounts: &AccountingConfig,
) -> Result<PostingTemplate, JournalError> {
    let first = transactions.first().ok_or(JournalError::EmptyPayrollBatch)?;

    let mut total = PayrollAmounts::default();
    for payroll in transactions {
        total.add(&PayrollAmounts::of(payroll)?);
    }

    build_payroll(
        first.pay_date,
        format!("Payroll batch - {} employees", transactions.len()),
        first.id.into_inner(),
        &total,
        accounts,
    )
}

#[derive(Debug, Default)]
struct PayrollAmounts {
    gross: Decimal,
    net: Decimal,
    employee_deductions: Decimal,
    employer_contributions: Decimal,
}

impl PayrollAmounts {
    fn of(payroll: &PayrollTransaction) -> Result<Self, JournalError> {
        if payroll.status != PayrollStatus::Paid {
            return Err(JournalError::PayrollNotPaid(payroll.id));
        }
        require_positive(payroll.gross_pay)?;
        for amount in [
            payroll.net_pay,
            payroll.employee_deductions,
            payroll.employer_contributions,
        ] {
            if amount < Decimal::ZERO {
                return Err(JournalError::NonPositiveAmount(amount));
            }
            if !is_whole_cents(amount) {
                return Err(JournalError::ExcessPrecision(amount));
            }
        }

        Ok(Self {
            gross: payroll.gross_pay,
            net: payroll.net_pay,
            employee_deductions: payroll.employee_deductions,
            employer_contributions: payroll.employer_contributions,
        })
    }

    fn add(&mut self, other: &Self) {
        self.gross += other.gross;
        self.net += other.net;
        self.employee_deductions += other.employee_deductions;
        self.employer_contributions += other.employer_contributions;
    }
}

fn build_payroll(
    entry_date: NaiveDate,
    description: String,
    reference_id: Uuid,
    amounts: &PayrollAmounts,
    accounts: &AccountingConfig,
) -> Result<PostingTemplate, JournalError> {
    let accrued = amounts.employer_contributions + amounts.employee_deductions;

    let mut lines = vec![debit(
        &accounts.salaries_expense,
        amounts.gross + amounts.employer_contributions,
    )];
    if amounts.net > Decimal::ZERO {
        lines.push(credit(&accounts.cash, amounts.net));
    }
    if accrued > Decimal::ZERO {
        lines.push(credit(&accounts.accrued_payroll_taxes, accrued));
    }

    let template = PostingTemplate {
        entry_date,
        description,
        reference_type: ReferenceType::Payroll,
        reference_id,
        lines,
    };
    ensure_balanced(template.totals(), accounts.balance_tolerance)?;
    Ok(template)
}

fn require_positive(amount: Decimal) -> Result<(), JournalError> {
    if amount <= Decimal::ZERO {
        return Err(JournalError::NonPositiveAmount(amount));
    }
    if !is_whole_cents(amount) {
        return Err(JournalError::ExcessPrecision(amount));
    }
    Ok(())
}

fn debit(code: &str, amount: Decimal) -> CodedLine {
    CodedLine {
        account_code: code.to_string(),
        debit: amount,
        credit: Decimal::ZERO,
        description: None,
    }
}

fn credit(code: &str, amount: Decimal) -> CodedLine {
    CodedLine {
        account_code: code.to_string(),
        debit: Decimal::ZERO,
        credit: amount,
        description: None,
    }
}
