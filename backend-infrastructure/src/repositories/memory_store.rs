use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use backend_domain::{
    apply, Attendee, AttendeeId, AttendeeRepository, AttendeeSummary, CommitOutcome, ScanCommit,
    ScanCounters, ScanEvent, ScanStatsRepository,
};

use super::roster_file::RosterEntry;

#[derive(Default)]
struct StoreState {
    attendees: HashMap<AttendeeId, Attendee>,
    /// Newest first per attendee.
    events: HashMap<AttendeeId, Vec<ScanEvent>>,
    counters: ScanCounters,
    revision_seq: u64,
}

impl StoreState {
    fn next_revision(&mut self) -> String {
        self.revision_seq += 1;
        self.revision_seq.to_string()
    }
}

/// Attendee directory held in process memory. Every commit runs under one
/// write lock, so the event, the attendee update and the counter move together.
#[derive(Default)]
pub struct InMemoryCheckInStore {
    state: RwLock<StoreState>,
}

impl InMemoryCheckInStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roster(entries: Vec<RosterEntry>) -> Self {
        let mut state = StoreState::default();
        for entry in entries {
            let mut attendee = entry.into_attendee();
            attendee.revision = Some(state.next_revision());
            state.attendees.insert(attendee.id.clone(), attendee);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.attendees.len()
    }
}

#[async_trait]
impl AttendeeRepository for InMemoryCheckInStore {
    async fn find_id_by_email(&self, email: &str) -> anyhow::Result<Option<AttendeeId>> {
        let state = self.state.read().await;
        Ok(state
            .attendees
            .values()
            .find(|attendee| attendee.email.as_deref() == Some(email))
            .map(|attendee| attendee.id.clone()))
    }

    async fn find_by_id(&self, id: &AttendeeId) -> anyhow::Result<Option<Attendee>> {
        Ok(self.state.read().await.attendees.get(id).cloned())
    }

    async fn list_attendees(&self) -> anyhow::Result<Vec<AttendeeSummary>> {
        let state = self.state.read().await;
        Ok(state.attendees.values().map(Attendee::summary).collect())
    }

    async fn list_scan_events(&self, id: &AttendeeId, limit: usize) -> anyhow::Result<Vec<ScanEvent>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .get(id)
            .map(|events| events.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn commit_scan(&self, commit: &ScanCommit) -> anyhow::Result<CommitOutcome> {
        let mut state = self.state.write().await;
        let attendee_id = commit.attendee_id();

        let Some(current) = state.attendees.get(attendee_id) else {
            return Err(anyhow!("attendee {} does not exist", attendee_id));
        };
        if current.revision != commit.expected_revision {
            return Ok(CommitOutcome::Conflict);
        }
        let event_exists = state
            .events
            .get(attendee_id)
            .is_some_and(|events| events.iter().any(|event| event.id == commit.draft.id));
        if event_exists {
            return Ok(CommitOutcome::Conflict);
        }

        let now = Utc::now();
        let revision = state.next_revision();
        let event = ScanEvent::from_draft(commit.draft.clone(), now);
        state
            .events
            .entry(attendee_id.clone())
            .or_default()
            .insert(0, event.clone());
        state.counters.increment(commit.category(), now);

        let attendee = state
            .attendees
            .get_mut(attendee_id)
            .ok_or_else(|| anyhow!("attendee {} does not exist", attendee_id))?;
        apply(&mut attendee.flags, &commit.transition);
        attendee.scan_count += commit.transition.scan_count_delta;
        attendee.last_scanned_at = Some(now);
        attendee.revision = Some(revision);
        let attendee_scan_count = attendee.scan_count;

        Ok(CommitOutcome::Committed {
            event,
            attendee_scan_count: Some(attendee_scan_count),
            counters: Some(state.counters.clone()),
        })
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ScanStatsRepository for InMemoryCheckInStore {
    async fn load_counters(&self) -> anyhow::Result<ScanCounters> {
        Ok(self.state.read().await.counters.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use backend_application::ScanProcessor;
    use backend_domain::{
        ApprovalStatus, FlagTransition, ScanCategory, ScanError, ScanEventDraft, ScanId,
    };

    fn roster() -> Vec<RosterEntry> {
        serde_json::from_str(
            r#"[
                {"id": "A1", "email": "a1@utd.edu"},
                {"id": "A2", "email": "Mixed@UTD.edu"}
            ]"#,
        )
        .unwrap()
    }

    fn commit_for(attendee: &Attendee, category: ScanCategory) -> ScanCommit {
        ScanCommit {
            draft: ScanEventDraft {
                id: ScanId::for_attendee(&attendee.id, category),
                attendee_id: attendee.id.clone(),
                category,
                raw_value: attendee.id.to_string(),
                created_at_label: "label".to_string(),
                status: ApprovalStatus::Approved,
            },
            // Built directly: some commits here are deliberately stale.
            transition: FlagTransition {
                category,
                flag_field: category.flag_field(),
                scan_count_delta: 1,
            },
            expected_revision: attendee.revision.clone(),
        }
    }

    #[tokio::test]
    async fn email_lookup_is_exact() {
        let store = InMemoryCheckInStore::from_roster(roster());
        assert_eq!(
            store.find_id_by_email("a1@utd.edu").await.unwrap(),
            Some(AttendeeId::from("A1"))
        );
        assert_eq!(store.find_id_by_email("A1@utd.edu").await.unwrap(), None);
        assert_eq!(
            store.find_id_by_email("Mixed@UTD.edu").await.unwrap(),
            Some(AttendeeId::from("A2"))
        );
    }

    #[tokio::test]
    async fn commit_applies_every_write_together() {
        let store = InMemoryCheckInStore::from_roster(roster());
        let attendee = store.find_by_id(&AttendeeId::from("A1")).await.unwrap().unwrap();

        let outcome = store
            .commit_scan(&commit_for(&attendee, ScanCategory::CheckIn))
            .await
            .unwrap();
        let CommitOutcome::Committed {
            attendee_scan_count,
            counters,
            ..
        } = outcome
        else {
            panic!("expected commit");
        };
        assert_eq!(attendee_scan_count, Some(1));
        assert_eq!(counters.unwrap().get(ScanCategory::CheckIn), 1);

        let updated = store.find_by_id(&attendee.id).await.unwrap().unwrap();
        assert!(updated.flags.checked_in);
        assert!(updated.last_scanned_at.is_some());
        assert_ne!(updated.revision, attendee.revision);
        assert_eq!(store.list_scan_events(&attendee.id, 250).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_revision_conflicts_without_writing() {
        let store = InMemoryCheckInStore::from_roster(roster());
        let attendee = store.find_by_id(&AttendeeId::from("A1")).await.unwrap().unwrap();
        store
            .commit_scan(&commit_for(&attendee, ScanCategory::CheckIn))
            .await
            .unwrap();

        let stale = commit_for(&attendee, ScanCategory::Dinner);
        assert!(matches!(
            store.commit_scan(&stale).await.unwrap(),
            CommitOutcome::Conflict
        ));
        assert_eq!(store.load_counters().await.unwrap().total(), 1);
    }

    #[tokio::test]
    async fn repeated_event_id_conflicts() {
        let store = InMemoryCheckInStore::from_roster(roster());
        let attendee = store.find_by_id(&AttendeeId::from("A1")).await.unwrap().unwrap();
        store
            .commit_scan(&commit_for(&attendee, ScanCategory::CheckIn))
            .await
            .unwrap();

        let fresh = store.find_by_id(&attendee.id).await.unwrap().unwrap();
        assert!(matches!(
            store
                .commit_scan(&commit_for(&fresh, ScanCategory::CheckIn))
                .await
                .unwrap(),
            CommitOutcome::Conflict
        ));
    }

    #[tokio::test]
    async fn concurrent_stations_record_one_scan() {
        let store = Arc::new(InMemoryCheckInStore::from_roster(roster()));
        let handles = (0..8)
            .map(|_| {
                let processor = ScanProcessor::new(store.clone());
                tokio::spawn(async move { processor.process("a1@utd.edu", ScanCategory::CheckIn).await })
            })
            .collect::<Vec<_>>();

        let mut approved = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => approved += 1,
                Err(err) => assert_eq!(err, ScanError::AlreadyScanned(ScanCategory::CheckIn)),
            }
        }
        assert_eq!(approved, 1);
        let attendee = store.find_by_id(&AttendeeId::from("A1")).await.unwrap().unwrap();
        assert_eq!(attendee.scan_count, 1);
        assert_eq!(store.load_counters().await.unwrap().get(ScanCategory::CheckIn), 1);
    }
}
