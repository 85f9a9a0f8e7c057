//! Fee schedules and initial charge population.

use bursar_shared::types::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::grade::GradeLevel;
use super::types::ChargeType;

/// Annual fees for one grade level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Grade level the schedule applies to.
    pub grade_level: GradeLevel,
    /// Tuition fee.
    pub tuition: Decimal,
    /// Miscellaneous fee.
    pub misc: Decimal,
    /// Other fees.
    pub other: Decimal,
}

/// A charge to insert when populating a new ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCharge {
    /// Fee component.
    pub charge_type: ChargeType,
    /// Positive amount.
    pub amount: Decimal,
    /// Memo, e.g. "Tuition Fee - Grade 3".
    pub description: String,
}

impl FeeSchedule {
    /// Sum of all components.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.tuition + self.misc + self.other
    }

    /// One charge per component greater than zero, rounded to cents.
    #[must_use]
    pub fn initial_charges(&self) -> Vec<PlannedCharge> {
        [
            (ChargeType::Tuition, round_money(self.tuition), "Tuition Fee"),
            (ChargeType::Misc, round_money(self.misc), "Miscellaneous Fee"),
            (ChargeType::Other, round_money(self.other), "Other Fees"),
        ]
        .into_iter()
        .filter(|(_, amount, _)| *amount > Decimal::ZERO)
        .map(|(charge_type, amount, label)| PlannedCharge {
            charge_type,
            amount,
            description: format!("{label} - {}", self.grade_level),
        })
        .collect()
    }

    /// Difference between the populated charge sum and the schedule total.
    ///
    /// `None` when they agree. A mismatch is a data-quality signal only.
    #[must_use]
    pub fn population_mismatch(&self, populated_total: Decimal) -> Option<Decimal> {
        let difference = populated_total - self.total();
        (!difference.is_zero()).then_some(difference)
    }
}
