use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use backend_application::AppState;
use backend_domain::{AttendeeRepository, ScanStatsRepository, StoreBackend};
use backend_infrastructure::{
    AppConfig, DefaultHealthService, FirestoreCheckInStore, InMemoryCheckInStore,
    RosterFileRepository,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let store_config = config.to_store_config();

        let (attendee_repo, stats_repo): (Arc<dyn AttendeeRepository>, Arc<dyn ScanStatsRepository>) =
            match store_config.backend {
                StoreBackend::Memory => {
                    let roster = RosterFileRepository::new()
                        .load_roster(&store_config.roster_path)
                        .await?;
                    let store = Arc::new(InMemoryCheckInStore::from_roster(roster));
                    info!(
                        attendees = store.len().await,
                        roster = %store_config.roster_path,
                        "using in-memory attendee store"
                    );
                    (store.clone(), store)
                }
                StoreBackend::Firestore => {
                    let store = Arc::new(FirestoreCheckInStore::new(
                        &store_config,
                        Duration::from_secs(runtime_config.request_timeout_seconds.max(3)),
                    )?);
                    info!(
                        collection = %store_config.attendees_collection,
                        "using firestore attendee store"
                    );
                    (store.clone(), store)
                }
            };

        let health_service = Arc::new(DefaultHealthService::new(attendee_repo.clone()));
        let state = AppState::new(runtime_config, attendee_repo, stats_repo, health_service);

        Ok(Self { state })
    }
}
