pub mod attendee_queries;
pub mod session_queries;
pub mod stats_queries;
