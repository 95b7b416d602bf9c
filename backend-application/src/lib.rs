// Backend Application Layer

pub mod commands;
pub mod dtos;
pub mod error;
pub mod metrics;
pub mod ops;
pub mod processor;
pub mod queries;
pub mod resolver;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

pub use error::AppError;
pub use metrics::Metrics;
pub use processor::{ScanProcessor, ScanReceipt};
pub use resolver::{AttendeeResolver, ResolverCache};
pub use session::{ScannerSession, SessionRegistry, SessionSnapshot};
pub use state::AppState;
