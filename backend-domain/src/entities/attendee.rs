// Attendee entity
// One registered participant and their one-shot eligibility flags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AttendeeId, ScanCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EligibilityFlags {
    pub checked_in: bool,
    pub saturday_lunch: bool,
    pub sunday_lunch: bool,
    pub dinner: bool,
    pub breakfast: bool,
}

impl EligibilityFlags {
    pub fn is_set(&self, category: ScanCategory) -> bool {
        match category {
            ScanCategory::CheckIn => self.checked_in,
            ScanCategory::SaturdayLunch => self.saturday_lunch,
            ScanCategory::SundayLunch => self.sunday_lunch,
            ScanCategory::Dinner => self.dinner,
            ScanCategory::Breakfast => self.breakfast,
        }
    }

    /// Flags only ever go from false to true.
    pub fn set(&mut self, category: ScanCategory) {
        let slot = match category {
            ScanCategory::CheckIn => &mut self.checked_in,
            ScanCategory::SaturdayLunch => &mut self.saturday_lunch,
            ScanCategory::SundayLunch => &mut self.sunday_lunch,
            ScanCategory::Dinner => &mut self.dinner,
            ScanCategory::Breakfast => &mut self.breakfast,
        };
        *slot = true;
    }

    /// Reads flags from a document where any alias of a category counts.
    pub fn from_lookup(lookup: impl Fn(&str) -> bool) -> Self {
        let mut flags = Self::default();
        for category in ScanCategory::ALL {
            if category.flag_aliases().iter().any(|alias| lookup(alias)) {
                flags.set(category);
            }
        }
        flags
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub id: AttendeeId,
    pub email: Option<String>,
    pub display_name: String,
    pub has_logged_in: bool,
    pub flags: EligibilityFlags,
    pub scan_count: u64,
    pub last_scanned_at: Option<DateTime<Utc>>,
    /// Store-issued concurrency token, compared on commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl Attendee {
    pub fn summary(&self) -> AttendeeSummary {
        AttendeeSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone().unwrap_or_default(),
            has_logged_in: self.has_logged_in,
            scan_count: self.scan_count,
            last_scanned_at: self.last_scanned_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendeeSummary {
    pub id: AttendeeId,
    pub display_name: String,
    pub email: String,
    pub has_logged_in: bool,
    pub scan_count: u64,
    pub last_scanned_at: Option<DateTime<Utc>>,
}
