use std::sync::Arc;

use async_trait::async_trait;
use backend_domain::ports::{AttendeeRepository, HealthCheckService};

pub struct DefaultHealthService {
    attendee_repo: Arc<dyn AttendeeRepository>,
}

impl DefaultHealthService {
    pub fn new(attendee_repo: Arc<dyn AttendeeRepository>) -> Self {
        Self { attendee_repo }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_store(&self) -> anyhow::Result<bool> {
        self.attendee_repo.ping().await.map(|_| true)
    }
}
