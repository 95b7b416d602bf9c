use serde::Serialize;

use crate::entities::EligibilityFlags;
use crate::errors::ScanError;
use crate::value_objects::{Eligibility, ScanCategory};

/// Mutation produced by a permitted scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagTransition {
    pub category: ScanCategory,
    pub flag_field: &'static str,
    pub scan_count_delta: u64,
}

pub fn eligibility(flags: &EligibilityFlags, category: ScanCategory) -> Eligibility {
    if flags.is_set(category) {
        Eligibility::Scanned
    } else if category.requires_check_in() && !flags.checked_in {
        Eligibility::NotEligibleYet
    } else {
        Eligibility::Eligible
    }
}

/// Decides whether `category` may be scanned given `flags`.
///
/// The check-in precondition is tested before the terminal-state guard, so a
/// gated category on a record that is not checked in is always rejected with
/// `PreconditionNotMet`, whatever its own flag says.
pub fn evaluate(flags: &EligibilityFlags, category: ScanCategory) -> Result<FlagTransition, ScanError> {
    if category.requires_check_in() && !flags.checked_in {
        return Err(ScanError::PreconditionNotMet(category));
    }
    if flags.is_set(category) {
        return Err(ScanError::AlreadyScanned(category));
    }
    Ok(FlagTransition {
        category,
        flag_field: category.flag_field(),
        scan_count_delta: 1,
    })
}

pub fn apply(flags: &mut EligibilityFlags, transition: &FlagTransition) {
    flags.set(transition.category);
}
