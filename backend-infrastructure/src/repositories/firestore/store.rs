use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, warn};

use backend_domain::{
    display_name, ApprovalStatus, Attendee, AttendeeId, AttendeeRepository, AttendeeSummary,
    CommitOutcome, EligibilityFlags, ScanCategory, ScanCommit, ScanCounters, ScanEvent, ScanId,
    ScanStatsRepository, StoreConfig,
};

use super::client::{CommitError, FirestoreClient};
use super::value::{Document, FieldValue};

const LIST_PAGE_SIZE: usize = 300;
const SCANS_SUBCOLLECTION: &str = "scans";

pub struct FirestoreCheckInStore {
    client: FirestoreClient,
    attendees_collection: String,
    stats_collection: String,
    stats_document: String,
}

impl FirestoreCheckInStore {
    pub fn new(config: &StoreConfig, timeout: Duration) -> Result<Self> {
        let project_id = config
            .firestore_project_id
            .as_deref()
            .ok_or_else(|| anyhow!("firestore_project_id is not configured"))?;
        let client = FirestoreClient::new(
            &config.firestore_base_url,
            project_id,
            &config.firestore_database,
            config.firestore_access_token.clone(),
            timeout,
        )?;
        Ok(Self {
            client,
            attendees_collection: config.attendees_collection.clone(),
            stats_collection: config.stats_collection.clone(),
            stats_document: config.stats_document.clone(),
        })
    }

    /// The three writes of one approved scan, applied by a single commit.
    pub fn commit_writes(&self, commit: &ScanCommit) -> Vec<Value> {
        let draft = &commit.draft;
        let transition = &commit.transition;
        let category = transition.category;
        let delta = i64::try_from(transition.scan_count_delta).unwrap_or(i64::MAX);
        let attendee_path = [self.attendees_collection.as_str(), draft.attendee_id.as_str()];
        let event_path = [
            self.attendees_collection.as_str(),
            draft.attendee_id.as_str(),
            SCANS_SUBCOLLECTION,
            draft.id.as_str(),
        ];
        let stats_path = [self.stats_collection.as_str(), self.stats_document.as_str()];

        let create_event = json!({
            "update": {
                "name": self.client.document_name(&event_path),
                "fields": {
                    "mode": FieldValue::String(category.as_str().to_string()).encode(),
                    "value": FieldValue::String(draft.raw_value.clone()).encode(),
                    "createdAtLabel": FieldValue::String(draft.created_at_label.clone()).encode(),
                    "status": FieldValue::String(draft.status.as_str().to_string()).encode(),
                }
            },
            "currentDocument": { "exists": false },
            "updateTransforms": [
                { "fieldPath": "scannedAt", "setToServerValue": "REQUEST_TIME" }
            ]
        });

        let precondition = match &commit.expected_revision {
            Some(revision) => json!({ "updateTime": revision }),
            None => json!({ "exists": true }),
        };
        let update_attendee = json!({
            "update": {
                "name": self.client.document_name(&attendee_path),
                "fields": { transition.flag_field: FieldValue::Bool(true).encode() }
            },
            "updateMask": { "fieldPaths": [transition.flag_field] },
            "currentDocument": precondition,
            "updateTransforms": [
                { "fieldPath": "scanCount", "increment": FieldValue::Integer(delta).encode() },
                { "fieldPath": "lastScannedAt", "setToServerValue": "REQUEST_TIME" }
            ]
        });

        let bump_stats = json!({
            "update": {
                "name": self.client.document_name(&stats_path),
                "fields": {}
            },
            "updateMask": { "fieldPaths": [] },
            "updateTransforms": [
                { "fieldPath": category.stats_field(), "increment": FieldValue::Integer(1).encode() },
                { "fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME" }
            ]
        });

        vec![create_event, update_attendee, bump_stats]
    }

    async fn load_event(&self, attendee_id: &AttendeeId, event_id: &ScanId) -> Result<Option<ScanEvent>> {
        let document = self
            .client
            .get_document(&[
                self.attendees_collection.as_str(),
                attendee_id.as_str(),
                SCANS_SUBCOLLECTION,
                event_id.as_str(),
            ])
            .await?;
        Ok(document.and_then(|document| scan_event_from_document(attendee_id, &document)))
    }
}

/// Firestore document ids are single, non-empty path segments.
fn is_document_id(value: &str) -> bool {
    !value.is_empty() && !value.contains('/') && value != "." && value != ".."
}

pub fn attendee_from_document(document: &Document) -> Attendee {
    let id = document.id().to_string();
    let flags = EligibilityFlags::from_lookup(|field| document.flag(field));
    let scan_count = document
        .integer("scanCount")
        .map(|count| count.max(0) as u64)
        .or_else(|| match document.field("scans") {
            Some(FieldValue::Array(scans)) => Some(scans.len() as u64),
            _ => None,
        })
        .unwrap_or_default();
    Attendee {
        display_name: display_name(&id, &document.string_fields()),
        email: document.string("email"),
        has_logged_in: document.flag("hasLoggedin") || document.flag("hasLoggedIn"),
        flags,
        scan_count,
        last_scanned_at: document.timestamp("lastScannedAt"),
        revision: document.update_time.clone(),
        id: AttendeeId(id),
    }
}

pub fn scan_event_from_document(attendee_id: &AttendeeId, document: &Document) -> Option<ScanEvent> {
    let category = document.string("mode")?.parse::<ScanCategory>().ok()?;
    Some(ScanEvent {
        id: ScanId(document.id().to_string()),
        attendee_id: attendee_id.clone(),
        category,
        raw_value: document.string("value").unwrap_or_default(),
        created_at_label: document.string("createdAtLabel").unwrap_or_default(),
        status: ApprovalStatus::Approved,
        scanned_at: document.timestamp("scannedAt").unwrap_or_else(Utc::now),
    })
}

pub fn counters_from_document(document: &Document) -> ScanCounters {
    let mut counters = ScanCounters {
        updated_at: document.timestamp("updatedAt"),
        ..ScanCounters::default()
    };
    for category in ScanCategory::ALL {
        if let Some(count) = document.integer(category.stats_field()) {
            counters.counts.insert(category, count.max(0) as u64);
        }
    }
    counters
}

#[async_trait]
impl AttendeeRepository for FirestoreCheckInStore {
    async fn find_id_by_email(&self, email: &str) -> Result<Option<AttendeeId>> {
        let query = json!({
            "from": [{ "collectionId": self.attendees_collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "email" },
                    "op": "EQUAL",
                    "value": FieldValue::String(email.to_string()).encode()
                }
            },
            "limit": 1
        });
        let documents = self.client.run_query(&[], query).await?;
        Ok(documents
            .first()
            .map(|document| AttendeeId::from(document.id())))
    }

    async fn find_by_id(&self, id: &AttendeeId) -> Result<Option<Attendee>> {
        if !is_document_id(id.as_str()) {
            return Ok(None);
        }
        let document = self
            .client
            .get_document(&[self.attendees_collection.as_str(), id.as_str()])
            .await?;
        Ok(document.as_ref().map(attendee_from_document))
    }

    async fn list_attendees(&self) -> Result<Vec<AttendeeSummary>> {
        let mut summaries = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .client
                .list_documents(&self.attendees_collection, LIST_PAGE_SIZE, page_token.as_deref())
                .await?;
            summaries.extend(
                page.documents
                    .iter()
                    .map(|document| attendee_from_document(document).summary()),
            );
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        debug!(count = summaries.len(), "listed attendees");
        Ok(summaries)
    }

    async fn list_scan_events(&self, id: &AttendeeId, limit: usize) -> Result<Vec<ScanEvent>> {
        if !is_document_id(id.as_str()) {
            return Ok(Vec::new());
        }
        let query = json!({
            "from": [{ "collectionId": SCANS_SUBCOLLECTION }],
            "orderBy": [{ "field": { "fieldPath": "scannedAt" }, "direction": "DESCENDING" }],
            "limit": limit
        });
        let documents = self
            .client
            .run_query(&[self.attendees_collection.as_str(), id.as_str()], query)
            .await?;
        Ok(documents
            .iter()
            .filter_map(|document| scan_event_from_document(id, document))
            .collect())
    }

    async fn commit_scan(&self, commit: &ScanCommit) -> Result<CommitOutcome> {
        let attendee_id = commit.attendee_id();
        match self.client.commit(self.commit_writes(commit)).await {
            Ok(_) => {}
            Err(CommitError::Conflict(message)) => {
                debug!(attendee = %attendee_id, reason = %message, "firestore commit precondition failed");
                return Ok(CommitOutcome::Conflict);
            }
            Err(CommitError::Failed(err)) => return Err(err),
        }

        // The commit landed; the reads below only fill in server-side values.
        let attendee_scan_count = match self.find_by_id(attendee_id).await {
            Ok(attendee) => attendee.map(|attendee| attendee.scan_count),
            Err(err) => {
                warn!(attendee = %attendee_id, error = %err, "failed to re-read attendee after commit");
                None
            }
        };
        let event = match self.load_event(attendee_id, &commit.draft.id).await {
            Ok(Some(event)) => event,
            Ok(None) => ScanEvent::from_draft(commit.draft.clone(), Utc::now()),
            Err(err) => {
                warn!(attendee = %attendee_id, error = %err, "failed to re-read scan event after commit");
                ScanEvent::from_draft(commit.draft.clone(), Utc::now())
            }
        };
        let counters = match self.load_counters().await {
            Ok(counters) => Some(counters),
            Err(err) => {
                warn!(error = %err, "failed to re-read scan counters after commit");
                None
            }
        };

        Ok(CommitOutcome::Committed {
            event,
            attendee_scan_count,
            counters,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .list_documents(&self.attendees_collection, 1, None)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ScanStatsRepository for FirestoreCheckInStore {
    async fn load_counters(&self) -> Result<ScanCounters> {
        let document = self
            .client
            .get_document(&[self.stats_collection.as_str(), self.stats_document.as_str()])
            .await?;
        Ok(document.as_ref().map(counters_from_document).unwrap_or_default())
    }
}
