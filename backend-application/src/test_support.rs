use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;

use backend_domain::{
    apply, Attendee, AttendeeId, AttendeeRepository, AttendeeSummary, CommitOutcome,
    EligibilityFlags, FlagTransition, HealthCheckService, RuntimeConfig, ScanCategory, ScanCommit,
    ScanCounters, ScanEvent, ScanEventDraft, ScanId, ScanStatsRepository,
};

use crate::AppState;

/// App state wired to one fake repository serving both store ports.
pub fn test_state() -> (AppState, Arc<FakeAttendeeRepository>) {
    let repo = Arc::new(FakeAttendeeRepository::new());
    let state = AppState::new(
        RuntimeConfig::default(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
    );
    (state, repo)
}

#[derive(Default)]
struct Inner {
    attendees: HashMap<AttendeeId, Attendee>,
    events: HashMap<AttendeeId, Vec<ScanEvent>>,
    counters: ScanCounters,
    next_revision: u64,
}

impl Inner {
    fn bump(&mut self, id: &AttendeeId) {
        self.next_revision += 1;
        let revision = self.next_revision.to_string();
        if let Some(attendee) = self.attendees.get_mut(id) {
            attendee.revision = Some(revision);
        }
    }

    fn apply(&mut self, draft: &ScanEventDraft, transition: &FlagTransition) -> (ScanEvent, u64) {
        let now = Utc::now();
        let event = ScanEvent::from_draft(draft.clone(), now);
        self.events
            .entry(draft.attendee_id.clone())
            .or_default()
            .insert(0, event.clone());
        self.counters.increment(draft.category, now);
        let attendee = self
            .attendees
            .get_mut(&draft.attendee_id)
            .expect("attendee present");
        apply(&mut attendee.flags, transition);
        attendee.scan_count += transition.scan_count_delta;
        attendee.last_scanned_at = Some(now);
        let count = attendee.scan_count;
        self.bump(&draft.attendee_id);
        (event, count)
    }
}

/// In-memory stand-in for the attendee directory with failure knobs.
#[derive(Default)]
pub struct FakeAttendeeRepository {
    inner: RwLock<Inner>,
    lookup_calls: AtomicUsize,
    commit_calls: AtomicUsize,
    fail_lookups: AtomicBool,
    fail_commits: AtomicBool,
    race_on_next_commit: Mutex<Option<ScanCategory>>,
    skip_read_back: AtomicBool,
    commit_delay: Mutex<Option<Duration>>,
}

impl FakeAttendeeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fake_add_attendee(&self, id: &str, email: Option<&str>) {
        self.fake_add_attendee_with_flags(id, email, EligibilityFlags::default());
    }

    pub fn fake_add_attendee_with_flags(&self, id: &str, email: Option<&str>, flags: EligibilityFlags) {
        let mut inner = self.inner.write().unwrap();
        let attendee_id = AttendeeId::from(id);
        inner.attendees.insert(
            attendee_id.clone(),
            Attendee {
                id: attendee_id.clone(),
                email: email.map(str::to_string),
                display_name: id.to_string(),
                has_logged_in: false,
                flags,
                scan_count: 0,
                last_scanned_at: None,
                revision: None,
            },
        );
        inner.bump(&attendee_id);
    }

    pub fn fake_set_display_name(&self, id: &str, name: &str) {
        let mut inner = self.inner.write().unwrap();
        if let Some(attendee) = inner.attendees.get_mut(&AttendeeId::from(id)) {
            attendee.display_name = name.to_string();
        }
    }

    pub fn fake_set_scan_count(&self, id: &str, scan_count: u64) {
        let mut inner = self.inner.write().unwrap();
        if let Some(attendee) = inner.attendees.get_mut(&AttendeeId::from(id)) {
            attendee.scan_count = scan_count;
        }
    }

    pub fn fake_attendee(&self, id: &str) -> Attendee {
        self.inner.read().unwrap().attendees[&AttendeeId::from(id)].clone()
    }

    pub fn fake_events(&self, id: &str) -> Vec<ScanEvent> {
        self.inner
            .read()
            .unwrap()
            .events
            .get(&AttendeeId::from(id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn fake_counters(&self) -> ScanCounters {
        self.inner.read().unwrap().counters.clone()
    }

    pub fn fake_lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn fake_commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    pub fn fake_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fake_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Commits still land, but report no read-back values.
    pub fn fake_skip_read_back(&self, skip: bool) {
        self.skip_read_back.store(skip, Ordering::SeqCst);
    }

    /// Holds every commit response for `delay` after the write has landed.
    pub fn fake_delay_commits(&self, delay: Duration) {
        *self.commit_delay.lock().unwrap() = Some(delay);
    }

    /// Makes another station win the next commit for `category`: its write
    /// lands between the caller's read and the caller's commit.
    pub fn fake_race_on_next_commit(&self, category: ScanCategory) {
        *self.race_on_next_commit.lock().unwrap() = Some(category);
    }

    fn commit_locked(&self, commit: &ScanCommit) -> anyhow::Result<CommitOutcome> {
        let mut inner = self.inner.write().unwrap();

        let race = self.race_on_next_commit.lock().unwrap().take();
        if let Some(category) = race {
            let rival = ScanEventDraft {
                id: ScanId::for_attendee(commit.attendee_id(), category),
                category,
                raw_value: "other-station".to_string(),
                ..commit.draft.clone()
            };
            let rival_transition = FlagTransition {
                category,
                flag_field: category.flag_field(),
                scan_count_delta: 1,
            };
            inner.apply(&rival, &rival_transition);
        }

        let Some(current) = inner.attendees.get(commit.attendee_id()) else {
            return Err(anyhow!("attendee {} missing", commit.attendee_id()));
        };
        let duplicate_event = inner
            .events
            .get(commit.attendee_id())
            .map(|events| events.iter().any(|event| event.id == commit.draft.id))
            .unwrap_or(false);
        if current.revision != commit.expected_revision || duplicate_event {
            return Ok(CommitOutcome::Conflict);
        }

        let (event, attendee_scan_count) = inner.apply(&commit.draft, &commit.transition);
        if self.skip_read_back.load(Ordering::SeqCst) {
            return Ok(CommitOutcome::Committed {
                event,
                attendee_scan_count: None,
                counters: None,
            });
        }
        Ok(CommitOutcome::Committed {
            event,
            attendee_scan_count: Some(attendee_scan_count),
            counters: Some(inner.counters.clone()),
        })
    }

    fn check_lookup(&self) -> anyhow::Result<()> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(anyhow!("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl AttendeeRepository for FakeAttendeeRepository {
    async fn find_id_by_email(&self, email: &str) -> anyhow::Result<Option<AttendeeId>> {
        self.check_lookup()?;
        let inner = self.inner.read().unwrap();
        Ok(inner
            .attendees
            .values()
            .find(|attendee| attendee.email.as_deref() == Some(email))
            .map(|attendee| attendee.id.clone()))
    }

    async fn find_by_id(&self, id: &AttendeeId) -> anyhow::Result<Option<Attendee>> {
        self.check_lookup()?;
        Ok(self.inner.read().unwrap().attendees.get(id).cloned())
    }

    async fn list_attendees(&self) -> anyhow::Result<Vec<AttendeeSummary>> {
        self.check_lookup()?;
        Ok(self
            .inner
            .read()
            .unwrap()
            .attendees
            .values()
            .map(Attendee::summary)
            .collect())
    }

    async fn list_scan_events(&self, id: &AttendeeId, limit: usize) -> anyhow::Result<Vec<ScanEvent>> {
        self.check_lookup()?;
        let inner = self.inner.read().unwrap();
        Ok(inner
            .events
            .get(id)
            .map(|events| events.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn commit_scan(&self, commit: &ScanCommit) -> anyhow::Result<CommitOutcome> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(anyhow!("permission denied"));
        }
        let outcome = self.commit_locked(commit)?;
        let delay = *self.commit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(outcome)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.check_lookup()
    }
}

#[async_trait]
impl HealthCheckService for FakeAttendeeRepository {
    async fn check_store(&self) -> anyhow::Result<bool> {
        Ok(self.ping().await.is_ok())
    }
}

#[async_trait]
impl ScanStatsRepository for FakeAttendeeRepository {
    async fn load_counters(&self) -> anyhow::Result<ScanCounters> {
        self.check_lookup()?;
        Ok(self.inner.read().unwrap().counters.clone())
    }
}
