use axum::routing::{get, post, put};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{attendee_handlers, ops_handlers, scanner_handlers, stats_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/scanner/sessions/:station",
            put(scanner_handlers::open_session)
                .get(scanner_handlers::get_session)
                .delete(scanner_handlers::close_session),
        )
        .route(
            "/v1/scanner/sessions/:station/scans",
            post(scanner_handlers::submit_scan),
        )
        .route("/v1/scanner/stats", get(stats_handlers::get_stats))
        .route("/v1/scanner/stats/stream", get(stats_handlers::stream_stats))
        .route("/v1/attendees", get(attendee_handlers::list_attendees))
        .route("/v1/attendees/:id", get(attendee_handlers::get_attendee))
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
