// Scan error taxonomy

use thiserror::Error;

use crate::value_objects::ScanCategory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scan category '{0}'")]
pub struct UnknownCategory(pub String);

/// Why a single scan attempt did not produce a scan event.
/// Every variant is local to one attempt; none ends a scanner session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("no QR value detected")]
    InvalidToken,
    #[error("no attendee found for \"{0}\"")]
    AttendeeNotFound(String),
    #[error("must be checked in before {0}")]
    PreconditionNotMet(ScanCategory),
    #[error("{} already scanned for this attendee", .0.label())]
    AlreadyScanned(ScanCategory),
    #[error("lookup failed: {0}")]
    LookupFailed(String),
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

impl ScanError {
    pub fn lookup(err: anyhow::Error) -> Self {
        ScanError::LookupFailed(format!("{err:#}"))
    }

    pub fn persistence(err: anyhow::Error) -> Self {
        ScanError::PersistenceFailed(format!("{err:#}"))
    }

    /// Rejections that need no investigation: the operator simply moves on.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            ScanError::LookupFailed(_) | ScanError::PersistenceFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_message_names_the_category() {
        let err = ScanError::PreconditionNotMet(ScanCategory::Dinner);
        assert_eq!(err.to_string(), "must be checked in before dinner");
    }

    #[test]
    fn already_scanned_message_uses_label() {
        let err = ScanError::AlreadyScanned(ScanCategory::SaturdayLunch);
        assert_eq!(
            err.to_string(),
            "Saturday-Lunch already scanned for this attendee"
        );
    }

    #[test]
    fn store_failures_keep_the_cause() {
        let err = ScanError::persistence(anyhow::anyhow!("permission denied"));
        assert_eq!(err.to_string(), "persistence failed: permission denied");
        assert!(!err.is_rejection());
        assert!(ScanError::InvalidToken.is_rejection());
    }
}
