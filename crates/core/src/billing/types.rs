//! Student ledger domain types.

use bursar_shared::types::{
    DiscountId, LedgerChargeId, LedgerPaymentId, StudentId, StudentLedgerId, UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::grade::GradeLevel;

/// Payment status derived from ledger totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerStatus {
    /// No payment received.
    #[serde(rename = "Unpaid")]
    Unpaid,
    /// Some payment received, balance still positive.
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    /// Balance at or below zero after at least one payment.
    #[serde(rename = "Fully Paid")]
    FullyPaid,
}

impl LedgerStatus {
    /// Derives the status from live totals.
    ///
    /// `Unpaid` when nothing has been paid, otherwise `Fully Paid` once the
    /// balance reaches zero and `Partially Paid` before that.
    #[must_use]
    pub fn derive(total_payments: Decimal, balance: Decimal) -> Self {
        if total_payments.is_zero() {
            Self::Unpaid
        } else if balance <= Decimal::ZERO {
            Self::FullyPaid
        } else {
            Self::PartiallyPaid
        }
    }

    /// Stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "Unpaid",
            Self::PartiallyPaid => "Partially Paid",
            Self::FullyPaid => "Fully Paid",
        }
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of ledger charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargeType {
    /// Tuition fee component.
    Tuition,
    /// Miscellaneous fee component.
    Misc,
    /// Other fee component.
    Other,
    /// Manual adjustment.
    Adjustment,
    /// Discount; stored with a negative amount.
    Discount,
}

impl ChargeType {
    /// Returns true for the components populated from a fee schedule.
    #[must_use]
    pub fn is_fee_component(self) -> bool {
        matches!(self, Self::Tuition | Self::Misc | Self::Other)
    }

    /// Stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tuition => "Tuition",
            Self::Misc => "Misc",
            Self::Other => "Other",
            Self::Adjustment => "Adjustment",
            Self::Discount => "Discount",
        }
    }
}

impl std::fmt::Display for ChargeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash over the counter.
    Cash,
    /// Check.
    Check,
    /// Bank transfer or deposit.
    BankTransfer,
    /// Card or online gateway.
    Online,
}

/// One ledger per student per school year.
///
/// Totals and status are a cache re-derived from the charge and payment rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentLedger {
    /// Unique identifier.
    pub id: StudentLedgerId,
    /// Student billed.
    pub student_id: StudentId,
    /// School year name, e.g. "2026-2027".
    pub school_year: String,
    /// Grade level used to pick the fee schedule.
    pub grade_level: Option<GradeLevel>,
    /// Sum of charge amounts (discounts are negative).
    pub total_charges: Decimal,
    /// Sum of payment amounts.
    pub total_payments: Decimal,
    /// `total_charges - total_payments`.
    pub balance: Decimal,
    /// Derived payment status.
    pub status: LedgerStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last totals recalculation.
    pub updated_at: DateTime<Utc>,
}

impl StudentLedger {
    /// A new ledger with zero totals.
    #[must_use]
    pub fn open(
        student_id: StudentId,
        school_year: String,
        grade_level: Option<GradeLevel>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StudentLedgerId::new(),
            student_id,
            school_year,
            grade_level,
            total_charges: Decimal::ZERO,
            total_payments: Decimal::ZERO,
            balance: Decimal::ZERO,
            status: LedgerStatus::Unpaid,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A charge, adjustment or discount on a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerCharge {
    /// Unique identifier.
    pub id: LedgerChargeId,
    /// Owning ledger.
    pub ledger_id: StudentLedgerId,
    /// Charge kind.
    pub charge_type: ChargeType,
    /// Signed amount; negative for discounts.
    pub amount: Decimal,
    /// Optional memo.
    pub description: Option<String>,
    /// Discount configuration applied, for discount rows.
    pub discount_id: Option<DiscountId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A payment received against a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerPayment {
    /// Unique identifier.
    pub id: LedgerPaymentId,
    /// Owning ledger.
    pub ledger_id: StudentLedgerId,
    /// Positive amount.
    pub amount: Decimal,
    /// Official receipt number, globally unique.
    pub or_number: String,
    /// Tender type.
    pub method: PaymentMethod,
    /// Cashier who processed the payment.
    pub processed_by: Option<UserId>,
    /// When the payment was received.
    pub paid_at: DateTime<Utc>,
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Positive amount.
    pub amount: Decimal,
    /// Official receipt number.
    pub or_number: String,
    /// Tender type.
    pub method: PaymentMethod,
    /// Cashier who processed the payment.
    pub processed_by: Option<UserId>,
}
