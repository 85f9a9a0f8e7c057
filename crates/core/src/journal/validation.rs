//! Journal entry validation rules.
//!
//! - At least 2 lines
//! - No negative amounts, no line carrying both a debit and a credit
//! - Amounts in whole cents
//! - Debits equal credits within the configured tolerance
//! - Every referenced account exists and is active

use bursar_shared::types::{AccountId, is_whole_cents};
use rust_decimal::Decimal;

use super::error::JournalError;
use super::types::{EntryTotals, LineInput};
use crate::accounts::Account;

/// Validates the shape and balance of manual entry lines.
///
/// Returns the entry totals on success.
pub fn validate_manual_lines(
    lines: &[LineInput],
    tolerance: Decimal,
) -> Result<EntryTotals, JournalError> {
    if lines.len() < 2 {
        return Err(JournalError::InsufficientLines(lines.len()));
    }

    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 1;
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(JournalError::NegativeAmount(line_number));
        }
        if line.debit > Decimal::ZERO && line.credit > Decimal::ZERO {
            return Err(JournalError::BothSidesOnLine(line_number));
        }
        for amount in [line.debit, line.credit] {
            if !is_whole_cents(amount) {
                return Err(JournalError::ExcessPrecision(amount));
            }
        }
    }

    let totals = EntryTotals::from_amounts(lines.iter().map(|l| (l.debit, l.credit)));
    if totals.debit.is_zero() && totals.credit.is_zero() {
        return Err(JournalError::ZeroAmountEntry);
    }

    ensure_balanced(totals, tolerance)?;
    Ok(totals)
}

/// Fails with `Unbalanced` unless debits equal credits within `tolerance`.
pub fn ensure_balanced(totals: EntryTotals, tolerance: Decimal) -> Result<(), JournalError> {
    if totals.is_balanced(tolerance) {
        Ok(())
    } else {
        Err(JournalError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
            difference: totals.difference(),
        })
    }
}

/// Checks that every line references an existing, active account.
pub fn validate_line_accounts<'a, F>(lines: &[LineInput], lookup: F) -> Result<(), JournalError>
where
    F: Fn(AccountId) -> Option<&'a Account>,
{
    for line in lines {
        let account = lookup(line.account_id)
            .ok_or(JournalError::AccountNotFound(line.account_id))?;
        if !account.is_active {
            return Err(JournalError::AccountInactive(line.account_id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{AccountType, NormalBalance};
    use bursar_shared::types::DEFAULT_BALANCE_TOLERANCE as TOLERANCE;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn account(is_active: bool) -> Account {
        Account {
            id: AccountId::new(),
            code: "1010".to_string(),
            name: "Cash".to_string(),
            account_type: AccountType::Asset,
            normal_balance: NormalBalance::Debit,
            parent_id: None,
            is_active,
        }
    }

    #[test]
    fn test_balanced_lines_accepted() {
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(250)),
            LineInput::credit(AccountId::new(), dec!(100)),
            LineInput::credit(AccountId::new(), dec!(150)),
        ];
        let totals = validate_manual_lines(&lines, TOLERANCE).unwrap();
        assert_eq!(totals.debit, dec!(250));
        assert_eq!(totals.credit, dec!(250));
    }

    #[test]
    fn test_unbalanced_lines_rejected_with_difference() {
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(500)),
            LineInput::credit(AccountId::new(), dec!(300)),
        ];
        let err = validate_manual_lines(&lines, TOLERANCE).unwrap_err();
        match err {
            JournalError::Unbalanced {
                debit,
                credit,
                difference,
            } => {
                assert_eq!(debit, dec!(500));
                assert_eq!(credit, dec!(300));
                assert_eq!(difference, dec!(200));
            }
            other => panic!("expected Unbalanced, got {other:?}"),
        }
    }

    #[test]
    fn test_single_line_rejected() {
        let lines = vec![LineInput::debit(AccountId::new(), dec!(100))];
        assert!(matches!(
            validate_manual_lines(&lines, TOLERANCE),
            Err(JournalError::InsufficientLines(1))
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(-100)),
            LineInput::credit(AccountId::new(), dec!(-100)),
        ];
        assert!(matches!(
            validate_manual_lines(&lines, TOLERANCE),
            Err(JournalError::NegativeAmount(1))
        ));
    }

    #[test]
    fn test_both_sides_rejected() {
        let mut line = LineInput::debit(AccountId::new(), dec!(100));
        line.credit = dec!(100);
        let lines = vec![LineInput::credit(AccountId::new(), dec!(0)), line];
        assert!(matches!(
            validate_manual_lines(&lines, TOLERANCE),
            Err(JournalError::BothSidesOnLine(2))
        ));
    }

    #[test]
    fn test_sub_cent_line_rejected() {
        // 0.004 on each side would balance, but NUMERIC(15,2) stores zeros.
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(100.004)),
            LineInput::credit(AccountId::new(), dec!(100.004)),
        ];
        assert!(matches!(
            validate_manual_lines(&lines, TOLERANCE),
            Err(JournalError::ExcessPrecision(a)) if a == dec!(100.004)
        ));
    }

    #[test]
    fn test_all_zero_rejected() {
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(0)),
            LineInput::credit(AccountId::new(), dec!(0)),
        ];
        assert!(matches!(
            validate_manual_lines(&lines, TOLERANCE),
            Err(JournalError::ZeroAmountEntry)
        ));
    }

    #[test]
    fn test_description_only_line_allowed() {
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(100)),
            LineInput::credit(AccountId::new(), dec!(100)),
            LineInput::debit(AccountId::new(), dec!(0)),
        ];
        assert!(validate_manual_lines(&lines, TOLERANCE).is_ok());
    }

    #[test]
    fn test_line_accounts_must_exist_and_be_active() {
        let active = account(true);
        let inactive = account(false);
        let mut chart = HashMap::new();
        chart.insert(active.id, active.clone());
        chart.insert(inactive.id, inactive.clone());

        let ok = vec![
            LineInput::debit(active.id, dec!(1)),
            LineInput::credit(active.id, dec!(1)),
        ];
        assert!(validate_line_accounts(&ok, |id| chart.get(&id)).is_ok());

        let with_inactive = vec![
            LineInput::debit(active.id, dec!(1)),
            LineInput::credit(inactive.id, dec!(1)),
        ];
        assert!(matches!(
            validate_line_accounts(&with_inactive, |id| chart.get(&id)),
            Err(JournalError::AccountInactive(id)) if id == inactive.id
        ));

        let missing = AccountId::new();
        let with_missing = vec![
            LineInput::debit(missing, dec!(1)),
            LineInput::credit(active.id, dec!(1)),
        ];
        assert!(matches!(
            validate_line_accounts(&with_missing, |id| chart.get(&id)),
            Err(JournalError::AccountNotFound(id)) if id == missing
        ));
    }
}
