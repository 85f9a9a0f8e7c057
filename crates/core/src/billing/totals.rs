//! Ledger totals derivation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{LedgerStatus, StudentLedger};

/// Totals and status derived from a ledger's charge and payment rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Sum of charge amounts (discounts negative).
    pub total_charges: Decimal,
    /// Sum of payment amounts.
    pub total_payments: Decimal,
    /// Charges minus payments.
    pub balance: Decimal,
    /// Derived status.
    pub status: LedgerStatus,
}

impl LedgerTotals {
    /// Derives totals from the raw charge and payment amounts.
    pub fn from_amounts<C, P>(charges: C, payments: P) -> Self
    where
        C: IntoIterator<Item = Decimal>,
        P: IntoIterator<Item = Decimal>,
    {
        let total_charges: Decimal = charges.into_iter().sum();
        let total_payments: Decimal = payments.into_iter().sum();
        let balance = total_charges - total_payments;

        Self {
            total_charges,
            total_payments,
            balance,
            status: LedgerStatus::derive(total_payments, balance),
        }
    }

    /// Returns true if the ledger's cached fields equal these totals.
    #[must_use]
    pub fn matches(&self, ledger: &StudentLedger) -> bool {
        ledger.total_charges == self.total_charges
            && ledger.total_payments == self.total_payments
            && ledger.balance == self.balance
            && ledger.status == self.status
    }

    /// Writes these totals into the ledger's cached fields.
    pub fn apply_to(&self, ledger: &mut StudentLedger) {
        ledger.total_charges = self.total_charges;
        ledger.total_payments = self.total_payments;
        ledger.balance = self.balance;
        ledger.status = self.status;
    }
}
