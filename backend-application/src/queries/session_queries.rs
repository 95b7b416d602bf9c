use crate::commands::scan_commands::normalize_station_id;
use crate::session::SessionSnapshot;
use crate::{AppError, AppState};

pub async fn get_session(state: &AppState, station_id: &str) -> Result<SessionSnapshot, AppError> {
    let station_id = normalize_station_id(station_id)?;
    let session = state
        .sessions
        .get(&station_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no scanner session for {}", station_id)))?;
    Ok(session.snapshot().await)
}
