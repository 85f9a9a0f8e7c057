//! Discount configuration and amount computation.

use bursar_shared::types::{DiscountId, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a discount's amount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiscountRate {
    /// Percentage of the base, e.g. `10` for 10%.
    Percentage(Decimal),
    /// Flat amount.
    Fixed(Decimal),
}

/// A named discount from the discount configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountConfig {
    /// Unique identifier; applied at most once per ledger.
    pub id: DiscountId,
    /// Display name, e.g. "Sibling Discount".
    pub name: String,
    /// Rate.
    pub rate: DiscountRate,
    /// Lower bound on the computed amount.
    pub min_amount: Option<Decimal>,
    /// Upper bound on the computed amount.
    pub max_amount: Option<Decimal>,
    /// Inactive discounts cannot be applied.
    pub is_active: bool,
}

impl DiscountConfig {
    /// Computes the discount for `base`, rounded to cents.
    ///
    /// Percentage discounts are clamped to `min_amount`/`max_amount`; fixed
    /// discounts are taken as configured.
    #[must_use]
    pub fn compute_amount(&self, base: Decimal) -> Decimal {
        match self.rate {
            DiscountRate::Fixed(amount) => round_money(amount),
            DiscountRate::Percentage(percent) => {
                let mut amount = round_money(base * percent / Decimal::ONE_HUNDRED);
                if let Some(min) = self.min_amount {
                    amount = amount.max(min);
                }
                if let Some(max) = self.max_amount {
                    amount = amount.min(max);
                }
                round_money(amount)
            }
        }
    }

    /// Charge memo for the applied discount.
    #[must_use]
    pub fn description(&self) -> String {
        match self.rate {
            DiscountRate::Percentage(percent) => {
                format!("{} ({}%)", self.name, percent.normalize())
            }
            DiscountRate::Fixed(_) => self.name.clone(),
        }
    }
}
