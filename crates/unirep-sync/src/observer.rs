//! the "emit after commit" hook: a pluggable observer notified with the
//! topic hash of every successfully committed event, so other observers
//! (metrics, a downstream queue) can be attached without touching the
//! ingestor loop.

use unirep_types::{LogPosition, Topic};

pub trait Observer: Send + Sync {
    fn on_event(&self, topic: Topic, position: LogPosition);
}

/// the default observer: logs at `info` level via `tracing`
#[derive(Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, topic: Topic, position: LogPosition) {
        tracing::info!(
            ?topic,
            block = position.block_number,
            tx_index = position.transaction_index,
            log_index = position.log_index,
            "committed event"
        );
    }
}

/// an observer that does nothing, for tests that don't care
#[derive(Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&self, _topic: Topic, _position: LogPosition) {}
}
