// Aggregate scan counters
// Best-effort global tally per category, increment-only

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ScanCategory;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanCounters {
    pub counts: BTreeMap<ScanCategory, u64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScanCounters {
    pub fn get(&self, category: ScanCategory) -> u64 {
        self.counts.get(&category).copied().unwrap_or_default()
    }

    pub fn increment(&mut self, category: ScanCategory, at: DateTime<Utc>) {
        *self.counts.entry(category).or_default() += 1;
        self.updated_at = Some(at);
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_per_category() {
        let mut counters = ScanCounters::default();
        let now = Utc::now();
        counters.increment(ScanCategory::Dinner, now);
        counters.increment(ScanCategory::Dinner, now);
        counters.increment(ScanCategory::CheckIn, now);
        assert_eq!(counters.get(ScanCategory::Dinner), 2);
        assert_eq!(counters.get(ScanCategory::Breakfast), 0);
        assert_eq!(counters.total(), 3);
        assert_eq!(counters.updated_at, Some(now));
    }
}
