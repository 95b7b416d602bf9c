use thiserror::Error;

use backend_domain::ScanError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
