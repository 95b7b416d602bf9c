use std::sync::Arc;
use std::time::Duration;

use backend_domain::ports::{AttendeeRepository, HealthCheckService, ScanStatsRepository};
use backend_domain::RuntimeConfig;

use crate::ops::StatsStreamHub;
use crate::processor::ScanProcessor;
use crate::session::SessionRegistry;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub attendee_repo: Arc<dyn AttendeeRepository>,
    pub stats_repo: Arc<dyn ScanStatsRepository>,
    pub health_service: Arc<dyn HealthCheckService>,
    pub processor: Arc<ScanProcessor>,
    pub sessions: Arc<SessionRegistry>,
    pub stats_hub: Arc<StatsStreamHub>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        attendee_repo: Arc<dyn AttendeeRepository>,
        stats_repo: Arc<dyn ScanStatsRepository>,
        health_service: Arc<dyn HealthCheckService>,
    ) -> Self {
        let processor = Arc::new(ScanProcessor::new(attendee_repo.clone()));
        let sessions = Arc::new(SessionRegistry::new(
            Duration::from_millis(config.debounce_millis),
            config.history_limit,
        ));
        Self {
            config,
            attendee_repo,
            stats_repo,
            health_service,
            processor,
            sessions,
            stats_hub: Arc::new(StatsStreamHub::default()),
            metrics: Arc::new(Metrics::default()),
        }
    }
}
