//! Journal entry numbering.
//!
//! Numbers have the form `JE-<year>-<seq>` with the sequence zero-padded to
//! three digits. Storage allocates sequences through an atomic per-year
//! counter; the scan helpers here seed that counter and serve imports.

/// Prefix shared by every entry number.
pub const ENTRY_NUMBER_PREFIX: &str = "JE";

/// The `JE-<year>-` prefix used to scope a scan to one year.
#[must_use]
pub fn year_prefix(year: i32) -> String {
    format!("{ENTRY_NUMBER_PREFIX}-{year}-")
}

/// Formats an entry number.
#[must_use]
pub fn format_entry_number(year: i32, sequence: i64) -> String {
    format!("{ENTRY_NUMBER_PREFIX}-{year}-{sequence:03}")
}

/// Extracts the sequence from a number belonging to `year`.
///
/// Returns `None` for numbers of other years or malformed numbers.
#[must_use]
pub fn parse_sequence(entry_number: &str, year: i32) -> Option<i64> {
    let digits = entry_number.strip_prefix(&year_prefix(year))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next sequence for `year` given the numbers already issued.
///
/// Numbers from other years or with unparseable suffixes are ignored.
pub fn next_sequence<'a, I>(year: i32, existing: I) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|number| parse_sequence(number, year))
        .max()
        .map_or(1, |max| max + 1)
}
