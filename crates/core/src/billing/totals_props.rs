//! Property-based tests for ledger derivation and the payment gate.

use bursar_shared::types::{DiscountId, StudentId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::book::LedgerBook;
use super::error::BillingError;
use super::types::{ChargeType, LedgerStatus, NewPayment, PaymentMethod, StudentLedger};

#[derive(Debug, Clone)]
enum Op {
    Charge(Decimal),
    Discount(Decimal, Option<usize>),
    Payment(Decimal),
}

/// Amounts from 0.01 to 50,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..5_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        amount().prop_map(Op::Charge),
        (amount(), prop::option::of(0usize..3)).prop_map(|(a, d)| Op::Discount(a, d)),
        amount().prop_map(Op::Payment),
    ]
}

fn apply_all(ops: &[Op]) -> LedgerBook {
    let discounts = [DiscountId::new(), DiscountId::new(), DiscountId::new()];
    let mut book = LedgerBook::new(
        StudentLedger::open(StudentId::new(), "2026-2027".into(), None),
        Vec::new(),
        Vec::new(),
    );

    for (n, op) in ops.iter().enumerate() {
        // Rejections are expected; the invariants must hold either way.
        let _ = match op {
            Op::Charge(a) => book.add_charge(ChargeType::Misc, *a, None).map(|_| ()),
            Op::Discount(a, d) => book
                .apply_discount(*a, d.map(|i| discounts[i]), None)
                .map(|_| ()),
            Op::Payment(a) => book
                .add_payment(NewPayment {
                    amount: *a,
                    or_number: format!("OR-{n:04}"),
                    method: PaymentMethod::Cash,
                    processed_by: None,
                })
                .map(|_| ()),
        };
    }
    book
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Cached totals always equal the sums of the rows.
    #[test]
    fn prop_totals_derived_from_rows(ops in prop::collection::vec(op(), 0..30)) {
        let book = apply_all(&ops);
        let charges: Decimal = book.charges.iter().map(|c| c.amount).sum();
        let payments: Decimal = book.payments.iter().map(|p| p.amount).sum();

        prop_assert_eq!(book.ledger.total_charges, charges);
        prop_assert_eq!(book.ledger.total_payments, payments);
        prop_assert_eq!(book.ledger.balance, charges - payments);
        prop_assert!(!book.is_stale());
    }

    /// Status follows the three-way rule.
    #[test]
    fn prop_status_rule(ops in prop::collection::vec(op(), 0..30)) {
        let book = apply_all(&ops);
        let expected = if book.ledger.total_payments.is_zero() {
            LedgerStatus::Unpaid
        } else if book.ledger.balance <= Decimal::ZERO {
            LedgerStatus::FullyPaid
        } else {
            LedgerStatus::PartiallyPaid
        };
        prop_assert_eq!(book.ledger.status, expected);
    }

    /// A configured discount appears at most once per ledger.
    #[test]
    fn prop_discount_single_application(ops in prop::collection::vec(op(), 0..30)) {
        let book = apply_all(&ops);
        let mut seen = std::collections::HashSet::new();
        for id in book.charges.iter().filter_map(|c| c.discount_id) {
            prop_assert!(seen.insert(id), "discount {} applied twice", id);
        }
    }

    /// Accepted payments never exceed the balance at the time they were made.
    #[test]
    fn prop_payment_never_exceeds_live_balance(
        ops in prop::collection::vec(op(), 0..30),
        extra in amount(),
    ) {
        let mut book = apply_all(&ops);
        let balance = book.live_balance();
        let attempt = balance + extra;
        let result = book.add_payment(NewPayment {
            amount: attempt,
            or_number: "OR-EXTRA".into(),
            method: PaymentMethod::Cash,
            processed_by: None,
        });

        if attempt > Decimal::ZERO {
            let rejected = matches!(result, Err(BillingError::PaymentExceedsBalance { .. }));
            prop_assert!(rejected);
        } else {
            let rejected = matches!(result, Err(BillingError::NonPositiveAmount(_)));
            prop_assert!(rejected);
        }
        prop_assert_eq!(book.live_balance(), balance);
    }
}
