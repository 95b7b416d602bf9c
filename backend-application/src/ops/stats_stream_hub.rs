use backend_domain::ScanCounters;
use tokio::sync::broadcast;

const CHANNEL_BUFFER: usize = 64;

/// Fan-out of aggregate counters to dashboard subscribers. Slow subscribers
/// lag and skip ahead; nothing here blocks a scan.
pub struct StatsStreamHub {
    tx: broadcast::Sender<ScanCounters>,
}

impl Default for StatsStreamHub {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_BUFFER);
        Self { tx }
    }
}

impl StatsStreamHub {
    pub fn subscribe(&self) -> broadcast::Receiver<ScanCounters> {
        self.tx.subscribe()
    }

    pub fn publish(&self, counters: &ScanCounters) {
        let _ = self.tx.send(counters.clone());
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::ScanCategory;
    use chrono::Utc;

    #[tokio::test]
    async fn subscribers_receive_published_counters() {
        let hub = StatsStreamHub::default();
        let mut rx = hub.subscribe();
        let mut counters = ScanCounters::default();
        counters.increment(ScanCategory::Dinner, Utc::now());

        hub.publish(&counters);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.get(ScanCategory::Dinner), 1);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let hub = StatsStreamHub::default();
        hub.publish(&ScanCounters::default());
        assert_eq!(hub.subscriber_count(), 0);
    }
}
