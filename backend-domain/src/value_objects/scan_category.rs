// Scan category value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::UnknownCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanCategory {
    CheckIn,
    SaturdayLunch,
    SundayLunch,
    Dinner,
    Breakfast,
}

impl ScanCategory {
    pub const ALL: [ScanCategory; 5] = [
        ScanCategory::CheckIn,
        ScanCategory::SaturdayLunch,
        ScanCategory::SundayLunch,
        ScanCategory::Dinner,
        ScanCategory::Breakfast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanCategory::CheckIn => "check-in",
            ScanCategory::SaturdayLunch => "saturday-lunch",
            ScanCategory::SundayLunch => "sunday-lunch",
            ScanCategory::Dinner => "dinner",
            ScanCategory::Breakfast => "breakfast",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScanCategory::CheckIn => "Check In",
            ScanCategory::SaturdayLunch => "Saturday-Lunch",
            ScanCategory::SundayLunch => "Sunday-Lunch",
            ScanCategory::Dinner => "Dinner",
            ScanCategory::Breakfast => "Breakfast",
        }
    }

    /// Attendee document field written when the category is scanned.
    pub fn flag_field(&self) -> &'static str {
        self.flag_aliases()[0]
    }

    /// Attendee document fields that count as "already scanned" when read.
    /// Older records use the shorter names.
    pub fn flag_aliases(&self) -> &'static [&'static str] {
        match self {
            ScanCategory::CheckIn => &["isCheckedIn", "checkedIn"],
            ScanCategory::SaturdayLunch => &["lunchd1", "lunch1"],
            ScanCategory::SundayLunch => &["lunchd2", "lunch2"],
            ScanCategory::Dinner => &["dinner"],
            ScanCategory::Breakfast => &["breakfast"],
        }
    }

    /// Field of the global stats document holding this category's total.
    pub fn stats_field(&self) -> &'static str {
        match self {
            ScanCategory::CheckIn => "checkIn",
            ScanCategory::SaturdayLunch => "saturdayLunch",
            ScanCategory::SundayLunch => "sundayLunch",
            ScanCategory::Dinner => "dinner",
            ScanCategory::Breakfast => "breakfast",
        }
    }

    pub fn requires_check_in(&self) -> bool {
        !matches!(self, ScanCategory::CheckIn)
    }

    pub fn help(&self) -> &'static str {
        match self {
            ScanCategory::CheckIn => "Use for event check in.",
            ScanCategory::SaturdayLunch => "Use for Saturday lunch distribution.",
            ScanCategory::SundayLunch => "Use for Sunday lunch distribution.",
            ScanCategory::Dinner => "Use for dinner scans.",
            ScanCategory::Breakfast => "Use for breakfast scans.",
        }
    }
}

impl fmt::Display for ScanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ScanCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slugs_case_insensitively() {
        assert_eq!(" Dinner ".parse::<ScanCategory>().unwrap(), ScanCategory::Dinner);
        assert_eq!(
            "SATURDAY-LUNCH".parse::<ScanCategory>().unwrap(),
            ScanCategory::SaturdayLunch
        );
        assert!("lunch".parse::<ScanCategory>().is_err());
    }

    #[test]
    fn serde_uses_slug() {
        let json = serde_json::to_string(&ScanCategory::SundayLunch).unwrap();
        assert_eq!(json, "\"sunday-lunch\"");
        let parsed: ScanCategory = serde_json::from_str("\"check-in\"").unwrap();
        assert_eq!(parsed, ScanCategory::CheckIn);
    }

    #[test]
    fn only_check_in_has_no_precondition() {
        let gated = ScanCategory::ALL
            .iter()
            .filter(|category| !category.requires_check_in())
            .collect::<Vec<_>>();
        assert_eq!(gated, vec![&ScanCategory::CheckIn]);
    }

    #[test]
    fn flag_field_is_first_alias() {
        assert_eq!(ScanCategory::CheckIn.flag_field(), "isCheckedIn");
        assert_eq!(ScanCategory::SaturdayLunch.flag_field(), "lunchd1");
    }
}
