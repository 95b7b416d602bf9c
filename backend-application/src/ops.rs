pub mod stats_stream_hub;

pub use stats_stream_hub::StatsStreamHub;
