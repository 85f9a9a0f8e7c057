//! Canonical grade levels.
//!
//! Fee schedules and ledgers share [`GradeLevel`] and its integer code.
//! Free-text grade names from older records go through
//! [`GradeLevel::parse_legacy`] once, at migration time.

use serde::{Deserialize, Serialize};

/// A school grade level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum GradeLevel {
    /// Kindergarten (code 0).
    Kindergarten,
    /// Grade 1.
    Grade1,
    /// Grade 2.
    Grade2,
    /// Grade 3.
    Grade3,
    /// Grade 4.
    Grade4,
    /// Grade 5.
    Grade5,
    /// Grade 6.
    Grade6,
    /// Grade 7.
    Grade7,
    /// Grade 8.
    Grade8,
    /// Grade 9.
    Grade9,
    /// Grade 10.
    Grade10,
    /// Grade 11.
    Grade11,
    /// Grade 12.
    Grade12,
}

const ALL_GRADES: [GradeLevel; 13] = [
    GradeLevel::Kindergarten,
    GradeLevel::Grade1,
    GradeLevel::Grade2,
    GradeLevel::Grade3,
    GradeLevel::Grade4,
    GradeLevel::Grade5,
    GradeLevel::Grade6,
    GradeLevel::Grade7,
    GradeLevel::Grade8,
    GradeLevel::Grade9,
    GradeLevel::Grade10,
    GradeLevel::Grade11,
    GradeLevel::Grade12,
];

const KINDERGARTEN_ALIASES: [&str; 4] = ["k", "kg", "kinder", "kindergarten"];

/// Prefixes stripped before reading a grade number, longest first.
const LEGACY_PREFIXES: [&str; 4] = ["grade", "gr.", "gr", "g"];

impl GradeLevel {
    /// All grade levels in ascending order.
    #[must_use]
    pub const fn all() -> [Self; 13] {
        ALL_GRADES
    }

    /// Stable integer code: 0 for Kindergarten, N for Grade N.
    #[must_use]
    pub const fn code(self) -> i16 {
        self as i16
    }

    /// Grade level for a stable code.
    #[must_use]
    pub fn from_code(code: i16) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| ALL_GRADES.get(idx).copied())
    }

    /// Display name, e.g. "Grade 3".
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Kindergarten => "Kindergarten".to_string(),
            other => format!("Grade {}", other.code()),
        }
    }

    /// Best-effort match of a free-text grade name.
    ///
    /// Accepts the exact name ("Grade 3"), prefixed forms ("grade-3",
    /// "Gr. 3"), bare numbers ("3") and the "G3" shorthand. Returns `None`
    /// for anything else.
    #[must_use]
    pub fn parse_legacy(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        if KINDERGARTEN_ALIASES.contains(&normalized.as_str()) {
            return Some(Self::Kindergarten);
        }

        let number = LEGACY_PREFIXES
            .iter()
            .find_map(|prefix| normalized.strip_prefix(prefix))
            .unwrap_or(&normalized)
            .trim_start_matches(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace());

        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        number
            .parse::<i16>()
            .ok()
            .filter(|n| *n >= 1)
            .and_then(Self::from_code)
    }
}

impl std::fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<GradeLevel> for i16 {
    fn from(grade: GradeLevel) -> Self {
        grade.code()
    }
}

impl TryFrom<i16> for GradeLevel {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("invalid grade level code: {code}"))
    }
}
