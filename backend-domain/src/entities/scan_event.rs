// Scan event entity
// Append-only audit record of one approved scan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::ScanCounters;
use crate::services::FlagTransition;
use crate::value_objects::{ApprovalStatus, AttendeeId, ScanCategory, ScanId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEventDraft {
    pub id: ScanId,
    pub attendee_id: AttendeeId,
    pub category: ScanCategory,
    pub raw_value: String,
    pub created_at_label: String,
    pub status: ApprovalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEvent {
    pub id: ScanId,
    pub attendee_id: AttendeeId,
    pub category: ScanCategory,
    pub raw_value: String,
    pub created_at_label: String,
    pub status: ApprovalStatus,
    pub scanned_at: DateTime<Utc>,
}

impl ScanEvent {
    pub fn from_draft(draft: ScanEventDraft, scanned_at: DateTime<Utc>) -> Self {
        Self {
            id: draft.id,
            attendee_id: draft.attendee_id,
            category: draft.category,
            raw_value: draft.raw_value,
            created_at_label: draft.created_at_label,
            status: draft.status,
            scanned_at,
        }
    }
}

/// One logical write: event append, flag flip, attendee counters and the
/// global counter. Stores apply it atomically or not at all.
#[derive(Debug, Clone)]
pub struct ScanCommit {
    pub draft: ScanEventDraft,
    /// Flag and counter mutation computed by `evaluate`.
    pub transition: FlagTransition,
    /// Revision the attendee had when it was validated.
    pub expected_revision: Option<String>,
}

impl ScanCommit {
    pub fn attendee_id(&self) -> &AttendeeId {
        &self.draft.attendee_id
    }

    pub fn category(&self) -> ScanCategory {
        self.draft.category
    }
}

#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// The read-back values are `None` when the store wrote but could not
    /// read them back.
    Committed {
        event: ScanEvent,
        attendee_scan_count: Option<u64>,
        counters: Option<ScanCounters>,
    },
    /// The attendee changed after it was read, or the event id is taken.
    Conflict,
}
