use async_trait::async_trait;

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_store(&self) -> anyhow::Result<bool>;
}
