use std::sync::atomic::{AtomicU64, Ordering};

use backend_domain::ScanError;

#[derive(Debug, Default)]
pub struct Metrics {
    scans_approved: AtomicU64,
    scans_rejected: AtomicU64,
    store_errors: AtomicU64,
    duplicates_suppressed: AtomicU64,
    busy_dropped: AtomicU64,
}

impl Metrics {
    pub fn record_approved(&self) {
        self.scans_approved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, err: &ScanError) {
        if err.is_rejection() {
            self.scans_rejected.fetch_add(1, Ordering::Relaxed);
        } else {
            self.store_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_duplicate(&self) {
        self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_busy(&self) {
        self.busy_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn approved(&self) -> u64 {
        self.scans_approved.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let approved = self.scans_approved.load(Ordering::Relaxed);
        let rejected = self.scans_rejected.load(Ordering::Relaxed);
        let errors = self.store_errors.load(Ordering::Relaxed);
        let duplicates = self.duplicates_suppressed.load(Ordering::Relaxed);
        let busy = self.busy_dropped.load(Ordering::Relaxed);

        format!(
            "# TYPE checkin_scans_approved_total counter\n\
checkin_scans_approved_total {}\n\
# TYPE checkin_scans_rejected_total counter\n\
checkin_scans_rejected_total {}\n\
# TYPE checkin_store_errors_total counter\n\
checkin_store_errors_total {}\n\
# TYPE checkin_duplicates_suppressed_total counter\n\
checkin_duplicates_suppressed_total {}\n\
# TYPE checkin_busy_dropped_total counter\n\
checkin_busy_dropped_total {}\n",
            approved, rejected, errors, duplicates, busy
        )
    }
}
