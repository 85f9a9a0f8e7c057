//! Accounting period types and date derivation.

use bursar_shared::types::{AccountingPeriodId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::PeriodError;

/// A monthly accounting period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Unique identifier.
    pub id: AccountingPeriodId,
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1..=12.
    pub month: u32,
    /// Display name, e.g. "October 2026".
    pub name: String,
    /// First day of the month.
    pub start_date: NaiveDate,
    /// Last day of the month.
    pub end_date: NaiveDate,
    /// Whether postings are frozen.
    pub is_closed: bool,
    /// Who closed the period.
    pub closed_by: Option<UserId>,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Notes supplied when closing.
    pub closing_notes: Option<String>,
    /// Who last reopened the period.
    pub reopened_by: Option<UserId>,
    /// When the period was last reopened.
    pub reopened_at: Option<DateTime<Utc>>,
    /// Why the period was last reopened.
    pub reopen_reason: Option<String>,
}

impl AccountingPeriod {
    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Name and date range of a calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSpan {
    /// Display name, e.g. "October 2026".
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
}

impl PeriodSpan {
    /// Derives the span of `year`-`month`.
    pub fn for_month(year: i32, month: u32) -> Result<Self, PeriodError> {
        let invalid = || PeriodError::InvalidPeriod { year, month };
        let start_date = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let end_date = last_day_of_month(year, month).ok_or_else(invalid)?;

        Ok(Self {
            name: format!("{} {year}", month_name(month)),
            start_date,
            end_date,
        })
    }
}

/// Returns the last day of a month.
fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_month?.pred_opt()
}

/// Returns month name.
fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(2026, 10, "October 2026", 31)]
    #[case(2026, 2, "February 2026", 28)]
    #[case(2028, 2, "February 2028", 29)]
    #[case(2026, 12, "December 2026", 31)]
    #[case(2026, 4, "April 2026", 30)]
    fn test_span_for_month(
        #[case] year: i32,
        #[case] month: u32,
        #[case] name: &str,
        #[case] last_day: u32,
    ) {
        let span = PeriodSpan::for_month(year, month).unwrap();
        assert_eq!(span.name, name);
        assert_eq!(span.start_date, ymd(year, month, 1));
        assert_eq!(span.end_date, ymd(year, month, last_day));
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(matches!(
            PeriodSpan::for_month(2026, 13),
            Err(PeriodError::InvalidPeriod { month: 13, .. })
        ));
        assert!(PeriodSpan::for_month(2026, 0).is_err());
    }
}
