use serde::{Deserialize, Serialize};

use backend_domain::{AttendeeSummary, Attendee, Eligibility, ScanCategory, ScanEvent};

#[derive(Debug, Clone, Deserialize)]
pub struct OpenSessionRequest {
    pub category: ScanCategory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitScanRequest {
    pub token: String,
    /// Switches the session mode before the token is processed.
    #[serde(default)]
    pub category: Option<ScanCategory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendeeListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryEligibility {
    pub category: ScanCategory,
    pub label: &'static str,
    pub state: Eligibility,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendeeDetail {
    pub attendee: Attendee,
    pub eligibility: Vec<CategoryEligibility>,
    pub scans: Vec<ScanEvent>,
}

pub type AttendeePage = PagedResult<AttendeeSummary>;
