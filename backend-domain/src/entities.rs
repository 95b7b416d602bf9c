// Domain entities
pub mod attendee;
pub mod config;
pub mod scan_counters;
pub mod scan_event;
pub mod scan_record;

pub use attendee::*;
pub use config::*;
pub use scan_counters::*;
pub use scan_event::*;
pub use scan_record::*;
