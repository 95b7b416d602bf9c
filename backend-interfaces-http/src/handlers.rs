pub mod attendee_handlers;
pub mod ops_handlers;
pub mod scanner_handlers;
pub mod stats_handlers;
