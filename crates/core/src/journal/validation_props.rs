//! Property-based tests for journal balance validation and system postings.

use bursar_shared::AccountingConfig;
use bursar_shared::types::{AccountId, DEFAULT_BALANCE_TOLERANCE, PayrollId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::JournalError;
use super::postings::{PayrollStatus, PayrollTransaction, payroll_batch_posting, payroll_posting};
use super::types::LineInput;
use super::validation::validate_manual_lines;

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Debit amounts plus a split of their total into credit lines.
fn balanced_lines() -> impl Strategy<Value = Vec<LineInput>> {
    prop::collection::vec(positive_amount(), 1..6).prop_flat_map(|debits| {
        let total: Decimal = debits.iter().copied().sum();
        let cents = (total * Decimal::ONE_HUNDRED)
            .trunc()
            .try_into()
            .unwrap_or(1i64);
        (Just(debits), 1i64..=cents.max(1)).prop_map(move |(debits, split)| {
            let first = Decimal::new(split, 2);
            let second = total - first;
            let mut lines: Vec<LineInput> = debits
                .iter()
                .map(|d| LineInput::debit(AccountId::new(), *d))
                .collect();
            lines.push(LineInput::credit(AccountId::new(), first));
            if second > Decimal::ZERO {
                lines.push(LineInput::credit(AccountId::new(), second));
            } else {
                lines.push(LineInput::credit(AccountId::new(), Decimal::ZERO));
            }
            lines
        })
    })
}

fn paid_payroll() -> impl Strategy<Value = PayrollTransaction> {
    (positive_amount(), 0i64..=100, positive_amount()).prop_map(|(gross, pct, employer)| {
        let deductions = (gross * Decimal::new(pct, 2)).round_dp(2);
        PayrollTransaction {
            id: PayrollId::new(),
            employee_name: "Employee".to_string(),
            pay_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 30).unwrap_or_default(),
            gross_pay: gross,
            net_pay: gross - deductions,
            employee_deductions: deductions,
            employer_contributions: employer,
            status: PayrollStatus::Paid,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Lines whose debits equal their credits always validate.
    #[test]
    fn prop_balanced_lines_accepted(lines in balanced_lines()) {
        let totals = validate_manual_lines(&lines, DEFAULT_BALANCE_TOLERANCE);
        prop_assert!(totals.is_ok(), "got {:?}", totals);
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
    }

    /// Any skew above one cent is rejected and reports the exact difference.
    #[test]
    fn prop_skewed_lines_rejected(
        lines in balanced_lines(),
        skew in (2i64..100_000).prop_map(|c| Decimal::new(c, 2)),
    ) {
        let mut lines = lines;
        lines[0].debit += skew;

        match validate_manual_lines(&lines, DEFAULT_BALANCE_TOLERANCE) {
            Err(JournalError::Unbalanced { difference, .. }) => prop_assert_eq!(difference, skew),
            other => prop_assert!(false, "expected Unbalanced, got {:?}", other),
        }
    }

    /// A skew of at most one cent is tolerated.
    #[test]
    fn prop_one_cent_tolerated(lines in balanced_lines()) {
        let mut lines = lines;
        lines[0].debit += Decimal::new(1, 2);
        prop_assert!(validate_manual_lines(&lines, DEFAULT_BALANCE_TOLERANCE).is_ok());
    }

    /// Consistent payroll always produces a balanced entry.
    #[test]
    fn prop_payroll_balanced(payroll in paid_payroll()) {
        let template = payroll_posting(&payroll, &AccountingConfig::default());
        prop_assert!(template.is_ok(), "got {:?}", template);
        let totals = template.unwrap().totals();
        prop_assert_eq!(totals.debit, totals.credit);
    }

    /// A batch debits Salaries for the sum of its members.
    #[test]
    fn prop_batch_equals_sum(batch in prop::collection::vec(paid_payroll(), 1..8)) {
        let template = payroll_batch_posting(&batch, &AccountingConfig::default()).unwrap();
        let expected: Decimal = batch
            .iter()
            .map(|p| p.gross_pay + p.employer_contributions)
            .sum();
        let totals = template.totals();
        prop_assert_eq!(totals.debit, expected);
        prop_assert_eq!(totals.credit, expected);
        prop_assert_eq!(template.reference_id, batch[0].id.into_inner());
    }
}
