use async_trait::async_trait;

use crate::entities::{Attendee, AttendeeSummary, CommitOutcome, ScanCommit, ScanCounters, ScanEvent};
use crate::value_objects::AttendeeId;

/// The attendee directory owned by the hosted document database.
#[async_trait]
pub trait AttendeeRepository: Send + Sync {
    /// Exact, case-sensitive match on the `email` field, first hit only.
    async fn find_id_by_email(&self, email: &str) -> anyhow::Result<Option<AttendeeId>>;
    async fn find_by_id(&self, id: &AttendeeId) -> anyhow::Result<Option<Attendee>>;
    async fn list_attendees(&self) -> anyhow::Result<Vec<AttendeeSummary>>;
    /// Newest first.
    async fn list_scan_events(&self, id: &AttendeeId, limit: usize) -> anyhow::Result<Vec<ScanEvent>>;
    /// Appends the event, flips the flag, bumps the attendee counters and the
    /// global counter as one atomic write. Returns `Conflict` without writing
    /// anything when the attendee revision moved or the event id exists.
    async fn commit_scan(&self, commit: &ScanCommit) -> anyhow::Result<CommitOutcome>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ScanStatsRepository: Send + Sync {
    async fn load_counters(&self) -> anyhow::Result<ScanCounters>;
}
