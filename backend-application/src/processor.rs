use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use backend_domain::{
    display_label, evaluate, ApprovalStatus, AttendeeId, AttendeeRepository, CommitOutcome,
    ScanCategory, ScanCommit, ScanCounters, ScanError, ScanEvent, ScanEventDraft, ScanId,
};

use crate::resolver::{AttendeeResolver, ResolverCache};

const MAX_COMMIT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ScanReceipt {
    pub attendee_id: AttendeeId,
    pub event: ScanEvent,
    pub scan_count: u64,
    /// `None` when the store could not read the counters back after writing.
    pub counters: Option<ScanCounters>,
}

/// Token in, scan event out: resolve, validate, commit.
pub struct ScanProcessor {
    repo: Arc<dyn AttendeeRepository>,
    resolver: AttendeeResolver,
}

impl ScanProcessor {
    pub fn new(repo: Arc<dyn AttendeeRepository>) -> Self {
        Self::with_cache(repo, Arc::new(ResolverCache::default()))
    }

    pub fn with_cache(repo: Arc<dyn AttendeeRepository>, cache: Arc<ResolverCache>) -> Self {
        let resolver = AttendeeResolver::new(repo.clone(), cache);
        Self { repo, resolver }
    }

    pub fn resolver(&self) -> &AttendeeResolver {
        &self.resolver
    }

    pub async fn process(&self, raw_token: &str, category: ScanCategory) -> Result<ScanReceipt, ScanError> {
        let token = raw_token.trim();
        if token.is_empty() {
            return Err(ScanError::InvalidToken);
        }
        let attendee_id = self.resolver.resolve(token).await?;

        // A conflict means the record moved between read and commit. Re-reading
        // turns a rival station's win into AlreadyScanned; anything else retries.
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let attendee = self
                .repo
                .find_by_id(&attendee_id)
                .await
                .map_err(ScanError::lookup)?
                .ok_or_else(|| ScanError::AttendeeNotFound(token.to_string()))?;

            let transition = evaluate(&attendee.flags, category)?;

            let now = Utc::now();
            let commit = ScanCommit {
                draft: ScanEventDraft {
                    id: ScanId::for_attendee(&attendee_id, category),
                    attendee_id: attendee_id.clone(),
                    category,
                    raw_value: token.to_string(),
                    created_at_label: display_label(now),
                    status: ApprovalStatus::Approved,
                },
                transition,
                expected_revision: attendee.revision.clone(),
            };

            match self
                .repo
                .commit_scan(&commit)
                .await
                .map_err(ScanError::persistence)?
            {
                CommitOutcome::Committed {
                    event,
                    attendee_scan_count,
                    counters,
                } => {
                    // The revision matched, so the count read above was current.
                    let attendee_scan_count = attendee_scan_count
                        .unwrap_or(attendee.scan_count + transition.scan_count_delta);
                    info!(
                        attendee = %attendee_id,
                        category = %category,
                        scan_count = attendee_scan_count,
                        "scan committed"
                    );
                    return Ok(ScanReceipt {
                        attendee_id,
                        event,
                        scan_count: attendee_scan_count,
                        counters,
                    });
                }
                CommitOutcome::Conflict => {
                    warn!(
                        attendee = %attendee_id,
                        category = %category,
                        attempt,
                        "scan commit conflicted, re-validating"
                    );
                }
            }
        }

        Err(ScanError::PersistenceFailed(format!(
            "attendee {} changed during {} commit attempts",
            attendee_id, MAX_COMMIT_ATTEMPTS
        )))
    }
}
