// Scan record entity
// Operator-facing history line kept by a scanner session

use serde::{Deserialize, Serialize};

use crate::value_objects::{ScanCategory, StatusTone};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: String,
    pub category: ScanCategory,
    pub value: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub tone: StatusTone,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ScanRecord>,
}

impl ScanOutcome {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tone: StatusTone::Info,
            text: text.into(),
            record: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tone: StatusTone::Error,
            text: text.into(),
            record: None,
        }
    }

    pub fn success(text: impl Into<String>, record: ScanRecord) -> Self {
        Self {
            tone: StatusTone::Success,
            text: text.into(),
            record: Some(record),
        }
    }
}
