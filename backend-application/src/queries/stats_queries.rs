use backend_domain::ScanCounters;

use crate::{AppError, AppState};

pub async fn get_scan_stats(state: &AppState) -> Result<ScanCounters, AppError> {
    Ok(state.stats_repo.load_counters().await?)
}
