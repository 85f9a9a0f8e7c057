//! Monthly accounting periods and the closing gate.

pub mod closing;
pub mod error;
pub mod types;

pub use closing::{ClosingGate, is_date_frozen};
pub use error::PeriodError;
pub use types::{AccountingPeriod, PeriodSpan};
