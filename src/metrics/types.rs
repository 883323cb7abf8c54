use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PostureState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub timestamp: DateTime<Utc>,
    pub from: PostureState,
    pub to: PostureState,
    pub tilt_angle_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub samples_processed: u64,
    /// Oldest samples discarded because the queue was full.
    pub samples_dropped: u64,
    /// Rejected at ingest or by the estimator.
    pub invalid_samples: u64,
    pub alerts_emitted: u64,
    pub queue_depth: usize,
    pub recent_transitions: Vec<TransitionRecord>,
}
