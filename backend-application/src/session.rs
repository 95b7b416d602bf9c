use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use backend_domain::{
    display_label, Admission, DuplicateSuppressor, ScanCategory, ScanError, ScanOutcome, ScanRecord,
};

use crate::processor::{ScanProcessor, ScanReceipt};

pub const DUPLICATE_TEXT: &str = "Rejected: duplicate QR detected too quickly.";
pub const BUSY_TEXT: &str = "Scanner busy: previous scan still processing.";

#[derive(Debug)]
pub enum SubmitKind {
    Busy,
    Duplicate,
    Approved(ScanReceipt),
    Rejected(ScanError),
}

#[derive(Debug)]
pub struct SessionReply {
    pub outcome: ScanOutcome,
    pub kind: SubmitKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub station_id: String,
    pub category: ScanCategory,
    pub label: &'static str,
    pub help: &'static str,
    pub in_flight: bool,
    pub last_status: Option<ScanOutcome>,
    pub history: Vec<ScanRecord>,
}

struct SessionState {
    category: ScanCategory,
    suppressor: DuplicateSuppressor,
    history: VecDeque<ScanRecord>,
    last_status: Option<ScanOutcome>,
}

/// One scanner station. Tokens are handled one at a time: a token that
/// arrives while the previous cycle is still in flight is dropped, not queued.
pub struct ScannerSession {
    station_id: String,
    history_limit: usize,
    in_flight: AtomicBool,
    state: Mutex<SessionState>,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScannerSession {
    pub fn new(station_id: String, category: ScanCategory, debounce: Duration, history_limit: usize) -> Self {
        Self {
            station_id,
            history_limit,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SessionState {
                category,
                suppressor: DuplicateSuppressor::new(debounce),
                history: VecDeque::new(),
                last_status: None,
            }),
        }
    }

    pub async fn select_category(&self, category: ScanCategory) {
        self.state.lock().await.category = category;
    }

    pub async fn category(&self) -> ScanCategory {
        self.state.lock().await.category
    }

    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }

    pub async fn submit(&self, processor: &ScanProcessor, raw_token: &str, now: Instant) -> SessionReply {
        let Some(_guard) = self.try_begin() else {
            return SessionReply {
                outcome: ScanOutcome::info(BUSY_TEXT),
                kind: SubmitKind::Busy,
            };
        };

        let token = raw_token.trim().to_string();
        let category = {
            let mut state = self.state.lock().await;
            if !token.is_empty() && state.suppressor.admit(&token, now) == Admission::Duplicate {
                let outcome = ScanOutcome::info(DUPLICATE_TEXT);
                state.last_status = Some(outcome.clone());
                return SessionReply {
                    outcome,
                    kind: SubmitKind::Duplicate,
                };
            }
            state.category
        };

        // The lock is released while the store round-trips run.
        let reply = match processor.process(&token, category).await {
            Ok(receipt) => {
                let record = ScanRecord {
                    id: uuid::Uuid::new_v4().to_string(),
                    category,
                    value: token.clone(),
                    created_at: display_label(Utc::now()),
                };
                let outcome = ScanOutcome::success(
                    format!("Approved: {} scan recorded for {}.", category.label(), token),
                    record,
                );
                SessionReply {
                    outcome,
                    kind: SubmitKind::Approved(receipt),
                }
            }
            Err(err) => SessionReply {
                outcome: ScanOutcome::error(format!("Rejected: {}.", err)),
                kind: SubmitKind::Rejected(err),
            },
        };

        let mut state = self.state.lock().await;
        if let Some(record) = &reply.outcome.record {
            state.history.push_front(record.clone());
            state.history.truncate(self.history_limit);
        }
        state.last_status = Some(reply.outcome.clone());
        reply
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            station_id: self.station_id.clone(),
            category: state.category,
            label: state.category.label(),
            help: state.category.help(),
            in_flight: self.in_flight.load(Ordering::Acquire),
            last_status: state.last_status.clone(),
            history: state.history.iter().cloned().collect(),
        }
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<ScannerSession>>>,
    debounce: Duration,
    history_limit: usize,
}

impl SessionRegistry {
    pub fn new(debounce: Duration, history_limit: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            debounce,
            history_limit: history_limit.max(1),
        }
    }

    /// Starts a session, or switches the mode of a running one.
    pub async fn open(&self, station_id: &str, category: ScanCategory) -> Arc<ScannerSession> {
        let existing = self.sessions.read().await.get(station_id).cloned();
        if let Some(session) = existing {
            session.select_category(category).await;
            return session;
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(station_id.to_string())
            .or_insert_with(|| {
                Arc::new(ScannerSession::new(
                    station_id.to_string(),
                    category,
                    self.debounce,
                    self.history_limit,
                ))
            })
            .clone()
    }

    pub async fn get(&self, station_id: &str) -> Option<Arc<ScannerSession>> {
        self.sessions.read().await.get(station_id).cloned()
    }

    /// A cycle already running keeps its `Arc` and finishes on its own.
    pub async fn close(&self, station_id: &str) -> bool {
        self.sessions.write().await.remove(station_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeAttendeeRepository;
    use backend_domain::StatusTone;

    fn setup() -> (Arc<FakeAttendeeRepository>, ScanProcessor, ScannerSession) {
        let repo = Arc::new(FakeAttendeeRepository::new());
        repo.fake_add_attendee("A1", Some("a1@utd.edu"));
        repo.fake_add_attendee("A2", Some("a2@utd.edu"));
        let processor = ScanProcessor::new(repo.clone());
        let session = ScannerSession::new(
            "desk-1".to_string(),
            ScanCategory::CheckIn,
            Duration::from_millis(1500),
            2,
        );
        (repo, processor, session)
    }

    #[tokio::test]
    async fn repeated_token_inside_window_yields_one_transition() {
        let (repo, processor, session) = setup();
        let start = Instant::now();

        let first = session.submit(&processor, "a1@utd.edu", start).await;
        assert_eq!(first.outcome.tone, StatusTone::Success);
        assert_eq!(first.outcome.text, "Approved: Check In scan recorded for a1@utd.edu.");

        let second = session
            .submit(&processor, "a1@utd.edu", start + Duration::from_millis(300))
            .await;
        assert_eq!(second.outcome.tone, StatusTone::Info);
        assert_eq!(second.outcome.text, DUPLICATE_TEXT);
        assert!(matches!(second.kind, SubmitKind::Duplicate));
        assert_eq!(repo.fake_commit_calls(), 1);
        assert_eq!(repo.fake_attendee("A1").scan_count, 1);
    }

    #[tokio::test]
    async fn repeated_token_after_window_is_validated_again() {
        let (repo, processor, session) = setup();
        let start = Instant::now();

        session.submit(&processor, "a1@utd.edu", start).await;
        let again = session
            .submit(&processor, "a1@utd.edu", start + Duration::from_millis(2000))
            .await;
        assert_eq!(again.outcome.tone, StatusTone::Error);
        assert_eq!(
            again.outcome.text,
            "Rejected: Check In already scanned for this attendee."
        );
        assert!(matches!(
            again.kind,
            SubmitKind::Rejected(ScanError::AlreadyScanned(ScanCategory::CheckIn))
        ));
        assert_eq!(repo.fake_attendee("A1").scan_count, 1);
    }

    #[tokio::test]
    async fn history_is_newest_first_and_capped() {
        let (repo, processor, session) = setup();
        repo.fake_add_attendee("A3", None);
        let start = Instant::now();

        session.submit(&processor, "A1", start).await;
        session.submit(&processor, "A2", start).await;
        session.submit(&processor, "A3", start).await;

        let snapshot = session.snapshot().await;
        let values = snapshot
            .history
            .iter()
            .map(|record| record.value.as_str())
            .collect::<Vec<_>>();
        assert_eq!(values, vec!["A3", "A2"]);
        assert_eq!(snapshot.label, "Check In");
        assert!(!snapshot.in_flight);
    }

    #[tokio::test]
    async fn rejections_are_not_added_to_history() {
        let (_repo, processor, session) = setup();
        session.select_category(ScanCategory::Dinner).await;

        let reply = session.submit(&processor, "A1", Instant::now()).await;
        assert_eq!(
            reply.outcome.text,
            "Rejected: must be checked in before dinner."
        );
        let snapshot = session.snapshot().await;
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.last_status, Some(reply.outcome));
    }

    #[tokio::test]
    async fn empty_token_reports_no_qr_value() {
        let (_repo, processor, session) = setup();
        let reply = session.submit(&processor, "  ", Instant::now()).await;
        assert_eq!(reply.outcome.text, "Rejected: no QR value detected.");
    }

    #[tokio::test]
    async fn token_during_in_flight_cycle_is_dropped() {
        let (repo, processor, session) = setup();
        let _held = session.try_begin().expect("first cycle starts");

        let reply = session.submit(&processor, "A1", Instant::now()).await;
        assert!(matches!(reply.kind, SubmitKind::Busy));
        assert_eq!(reply.outcome.text, BUSY_TEXT);
        assert_eq!(repo.fake_lookup_calls(), 0);
    }

    #[tokio::test]
    async fn registry_open_switches_mode_and_close_drops_session() {
        let registry = SessionRegistry::new(Duration::from_millis(1500), 100);
        let session = registry.open("desk-1", ScanCategory::CheckIn).await;
        let again = registry.open("desk-1", ScanCategory::Dinner).await;
        assert!(Arc::ptr_eq(&session, &again));
        assert_eq!(session.category().await, ScanCategory::Dinner);
        assert_eq!(registry.len().await, 1);

        assert!(registry.close("desk-1").await);
        assert!(!registry.close("desk-1").await);
        assert!(registry.get("desk-1").await.is_none());
    }
}
