//! Ledger aggregate: a ledger with its charge and payment rows.
//!
//! Every mutation goes through [`LedgerBook`], which checks the business
//! rules against the live rows and then re-derives the cached totals. Storage
//! loads the book under a row lock, mutates it, and persists the new row and
//! the recalculated totals in the same transaction.

use bursar_shared::types::{DiscountId, LedgerChargeId, LedgerPaymentId, is_whole_cents};
use chrono::Utc;
use rust_decimal::Decimal;

use super::error::BillingError;
use super::fees::FeeSchedule;
use super::totals::LedgerTotals;
use super::types::{ChargeType, LedgerCharge, LedgerPayment, NewPayment, StudentLedger};

/// A ledger with the rows its totals are derived from.
#[derive(Debug, Clone)]
pub struct LedgerBook {
    /// Ledger header with cached totals.
    pub ledger: StudentLedger,
    /// Charges, adjustments and discounts.
    pub charges: Vec<LedgerCharge>,
    /// Payments.
    pub payments: Vec<LedgerPayment>,
}

/// Outcome of populating initial charges.
#[derive(Debug, Clone, Default)]
pub struct Population {
    /// Rows added; empty when the ledger already had charges.
    pub added: Vec<LedgerCharge>,
    /// Populated sum minus schedule total, when they disagree.
    pub mismatch: Option<Decimal>,
}

impl LedgerBook {
    /// Wraps loaded rows.
    #[must_use]
    pub fn new(
        ledger: StudentLedger,
        charges: Vec<LedgerCharge>,
        payments: Vec<LedgerPayment>,
    ) -> Self {
        Self {
            ledger,
            charges,
            payments,
        }
    }

    /// Totals derived from the live rows.
    #[must_use]
    pub fn totals(&self) -> LedgerTotals {
        LedgerTotals::from_amounts(
            self.charges.iter().map(|c| c.amount),
            self.payments.iter().map(|p| p.amount),
        )
    }

    /// Outstanding balance from the live rows, ignoring the cached balance.
    #[must_use]
    pub fn live_balance(&self) -> Decimal {
        self.totals().balance
    }

    /// Returns true if the ledger has no charges at all.
    #[must_use]
    pub fn needs_initial_charges(&self) -> bool {
        self.charges.is_empty()
    }

    /// Returns true if the cached totals disagree with the rows.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        !self.totals().matches(&self.ledger)
    }

    /// Re-derives the cached totals from the rows.
    ///
    /// This is the only writer of the ledger's totals and status.
    pub fn recalculate(&mut self) -> LedgerTotals {
        let totals = self.totals();
        totals.apply_to(&mut self.ledger);
        self.ledger.updated_at = Utc::now();
        totals
    }

    /// Sum of tuition charges, the base for percentage discounts.
    #[must_use]
    pub fn tuition_total(&self) -> Decimal {
        self.charges
            .iter()
            .filter(|c| c.charge_type == ChargeType::Tuition)
            .map(|c| c.amount)
            .sum()
    }

    /// Returns true if the discount configuration is already applied.
    #[must_use]
    pub fn has_discount(&self, discount_id: DiscountId) -> bool {
        self.charges
            .iter()
            .any(|c| c.discount_id == Some(discount_id))
    }

    /// Inserts one charge per positive fee component, if the ledger is empty.
    pub fn populate_initial_charges(&mut self, schedule: &FeeSchedule) -> Population {
        if !self.needs_initial_charges() {
            return Population::default();
        }

        let added: Vec<LedgerCharge> = schedule
            .initial_charges()
            .into_iter()
            .map(|plan| {
                self.new_charge(plan.charge_type, plan.amount, Some(plan.description), None)
            })
            .collect();
        self.charges.extend(added.iter().cloned());
        self.recalculate();

        let populated: Decimal = self
            .charges
            .iter()
            .filter(|c| c.charge_type.is_fee_component())
            .map(|c| c.amount)
            .sum();

        Population {
            added,
            mismatch: schedule.population_mismatch(populated),
        }
    }

    /// Appends a positive charge.
    ///
    /// A `Discount` charge type is routed through [`Self::apply_discount`].
    pub fn add_charge(
        &mut self,
        charge_type: ChargeType,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<LedgerCharge, BillingError> {
        if charge_type == ChargeType::Discount {
            return self.apply_discount(amount, None, description);
        }
        require_money(amount)?;

        let charge = self.new_charge(charge_type, amount, description, None);
        self.charges.push(charge.clone());
        self.recalculate();
        Ok(charge)
    }

    /// Appends a discount as a negative charge.
    ///
    /// A discount configuration may be applied at most once per ledger.
    pub fn apply_discount(
        &mut self,
        amount: Decimal,
        discount_id: Option<DiscountId>,
        description: Option<String>,
    ) -> Result<LedgerCharge, BillingError> {
        require_money(amount)?;
        if let Some(discount_id) = discount_id
            && self.has_discount(discount_id)
        {
            return Err(BillingError::DuplicateDiscount {
                ledger_id: self.ledger.id,
                discount_id,
            });
        }

        let charge = self.new_charge(ChargeType::Discount, -amount, description, discount_id);
        self.charges.push(charge.clone());
        self.recalculate();
        Ok(charge)
    }

    /// Checks a payment against the live balance without recording it.
    pub fn check_payment(&self, payment: &NewPayment) -> Result<(), BillingError> {
        require_money(payment.amount)?;
        if payment.or_number.trim().is_empty() {
            return Err(BillingError::OrNumberRequired);
        }

        let balance = self.live_balance();
        if payment.amount > balance {
            return Err(BillingError::PaymentExceedsBalance {
                amount: payment.amount,
                balance,
            });
        }
        Ok(())
    }

    /// Records a payment.
    ///
    /// OR-number uniqueness is a storage concern and is not checked here.
    pub fn add_payment(&mut self, payment: NewPayment) -> Result<LedgerPayment, BillingError> {
        self.check_payment(&payment)?;

        let row = LedgerPayment {
            id: LedgerPaymentId::new(),
            ledger_id: self.ledger.id,
            amount: payment.amount,
            or_number: payment.or_number.trim().to_string(),
            method: payment.method,
            processed_by: payment.processed_by,
            paid_at: Utc::now(),
        };
        self.payments.push(row.clone());
        self.recalculate();
        Ok(row)
    }

    fn new_charge(
        &self,
        charge_type: ChargeType,
        amount: Decimal,
        description: Option<String>,
        discount_id: Option<DiscountId>,
    ) -> LedgerCharge {
        LedgerCharge {
            id: LedgerChargeId::new(),
            ledger_id: self.ledger.id,
            charge_type,
            amount,
            description,
            discount_id,
            created_at: Utc::now(),
        }
    }
}

/// Positive and in whole cents, so the stored rows sum to the cached totals.
fn require_money(amount: Decimal) -> Result<(), BillingError> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::NonPositiveAmount(amount));
    }
    if !is_whole_cents(amount) {
        return Err(BillingError::ExcessPrecision(amount));
    }
    Ok(())
}
