//! Account balance calculations.
//!
//! A balance is never stored; it is a fold over the account's posted lines:
//! - Debit-normal: balance += debit - credit
//! - Credit-normal: balance += credit - debit

use rust_decimal::Decimal;

use super::types::NormalBalance;

/// Folds `(debit, credit)` pairs into a signed running total.
pub fn fold_balance<I>(normal_balance: NormalBalance, lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    lines
        .into_iter()
        .fold(Decimal::ZERO, |acc, (debit, credit)| {
            acc + normal_balance.signed_change(debit, credit)
        })
}
