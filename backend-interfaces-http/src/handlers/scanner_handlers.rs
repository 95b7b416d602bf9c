use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands::scan_commands;
use backend_application::dtos::{OpenSessionRequest, SubmitScanRequest};
use backend_application::queries::session_queries;
use backend_application::{AppState, SessionSnapshot};
use backend_domain::ScanOutcome;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn open_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(station): Path<String>,
    Json(payload): Json<OpenSessionRequest>,
) -> Result<Json<SessionSnapshot>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let snapshot = scan_commands::open_session(&state, &station, payload.category).await?;
    Ok(Json(snapshot))
}

pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(station): Path<String>,
) -> Result<Json<SessionSnapshot>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let snapshot = session_queries::get_session(&state, &station).await?;
    Ok(Json(snapshot))
}

pub async fn close_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(station): Path<String>,
) -> Result<StatusCode, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    scan_commands::close_session(&state, &station).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Always answers with the operator status line; rejections are not HTTP errors.
pub async fn submit_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(station): Path<String>,
    Json(payload): Json<SubmitScanRequest>,
) -> Result<Json<ScanOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome = scan_commands::submit_scan(&state, &station, payload).await?;
    Ok(Json(outcome))
}
