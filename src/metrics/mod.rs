mod types;

pub use types::{MetricsSnapshot, TransitionRecord};

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::Classification;
use crate::sensing::SampleQueue;

const MAX_RECENT_TRANSITIONS: usize = 20;

/// Worker-side counters for one session. Ingest-side counters live on the
/// `SampleQueue` and are merged at snapshot time.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_transitions: Vec<TransitionRecord>,
    samples_processed: u64,
    invalid_samples: u64,
    alerts_emitted: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_transitions: Vec::with_capacity(MAX_RECENT_TRANSITIONS),
                samples_processed: 0,
                invalid_samples: 0,
                alerts_emitted: 0,
            })),
        }
    }

    pub async fn record_processed(&self, classification: &Classification, alerts: usize) {
        let mut state = self.inner.lock().await;

        state.samples_processed += 1;
        state.alerts_emitted += alerts as u64;

        if classification.changed() {
            state.recent_transitions.push(TransitionRecord {
                timestamp: classification.timestamp,
                from: classification.previous,
                to: classification.state,
                tilt_angle_deg: classification.tilt_angle_deg,
            });

            if state.recent_transitions.len() > MAX_RECENT_TRANSITIONS {
                state.recent_transitions.remove(0);
            }
        }
    }

    pub async fn record_invalid(&self) {
        self.inner.lock().await.invalid_samples += 1;
    }

    pub async fn record_alerts(&self, alerts: usize) {
        self.inner.lock().await.alerts_emitted += alerts as u64;
    }

    pub async fn invalid_samples(&self) -> u64 {
        self.inner.lock().await.invalid_samples
    }

    pub async fn get_snapshot(&self, queue: &SampleQueue) -> MetricsSnapshot {
        let state = self.inner.lock().await;

        MetricsSnapshot {
            samples_processed: state.samples_processed,
            samples_dropped: queue.samples_dropped(),
            invalid_samples: state.invalid_samples + queue.invalid_samples(),
            alerts_emitted: state.alerts_emitted,
            queue_depth: queue.len(),
            recent_transitions: state.recent_transitions.clone(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
