// Pure domain services, independent of storage
pub mod display_name;
pub mod duplicate_suppressor;
pub mod eligibility;

pub use display_name::display_name;
pub use duplicate_suppressor::*;
pub use eligibility::{apply, eligibility, evaluate, FlagTransition};
