use std::time::Instant;

use anyhow::anyhow;
use tracing::{info, warn};

use crate::dtos::SubmitScanRequest;
use crate::session::{ScannerSession, SessionSnapshot, SubmitKind};
use crate::{AppError, AppState};
use backend_domain::{ScanCategory, ScanOutcome};

pub(crate) fn normalize_station_id(station_id: &str) -> Result<String, AppError> {
    let station_id = station_id.trim().to_lowercase();
    if station_id.is_empty() {
        return Err(AppError::BadRequest("station_id must not be empty".to_string()));
    }
    Ok(station_id)
}

pub async fn open_session(
    state: &AppState,
    station_id: &str,
    category: ScanCategory,
) -> Result<SessionSnapshot, AppError> {
    let station_id = normalize_station_id(station_id)?;
    let session = state.sessions.open(&station_id, category).await;
    info!(station = %station_id, category = %category, "scanner session opened");
    Ok(session.snapshot().await)
}

pub async fn submit_scan(
    state: &AppState,
    station_id: &str,
    request: SubmitScanRequest,
) -> Result<ScanOutcome, AppError> {
    let station_id = normalize_station_id(station_id)?;
    let session = state
        .sessions
        .get(&station_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no scanner session for {}", station_id)))?;

    // Detached: a dropped request must not stop a cycle between the store
    // write and the session, metrics and stream updates.
    let state = state.clone();
    let cycle = tokio::spawn(async move {
        run_scan_cycle(&state, &station_id, &session, request).await
    });
    cycle
        .await
        .map_err(|err| AppError::Internal(anyhow!("scan cycle aborted: {}", err)))
}

async fn run_scan_cycle(
    state: &AppState,
    station_id: &str,
    session: &ScannerSession,
    request: SubmitScanRequest,
) -> ScanOutcome {
    if let Some(category) = request.category {
        session.select_category(category).await;
    }

    let reply = session
        .submit(&state.processor, &request.token, Instant::now())
        .await;
    match &reply.kind {
        SubmitKind::Approved(receipt) => {
            state.metrics.record_approved();
            match &receipt.counters {
                Some(counters) => state.stats_hub.publish(counters),
                None => warn!(
                    station = %station_id,
                    "scan counters unavailable, stream update skipped"
                ),
            }
        }
        SubmitKind::Rejected(err) => {
            state.metrics.record_failure(err);
            if err.is_rejection() {
                info!(station = %station_id, reason = %err, "scan rejected");
            } else {
                warn!(station = %station_id, error = %err, "scan failed against the store");
            }
        }
        SubmitKind::Duplicate => state.metrics.record_duplicate(),
        SubmitKind::Busy => state.metrics.record_busy(),
    }
    reply.outcome
}

pub async fn close_session(state: &AppState, station_id: &str) -> Result<(), AppError> {
    let station_id = normalize_station_id(station_id)?;
    if !state.sessions.close(&station_id).await {
        return Err(AppError::NotFound(format!("no scanner session for {}", station_id)));
    }
    info!(station = %station_id, "scanner session closed");
    Ok(())
}
