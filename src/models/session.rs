use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Running,
    Completed,
    Interrupted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "Running",
            SessionStatus::Completed => "Completed",
            SessionStatus::Interrupted => "Interrupted",
        }
    }
}

/// Running totals for one monitoring session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub sample_count: u64,
    pub safe_sample_count: u64,
    /// Sum of `|tiltAngleDeg|` over every observed reading.
    pub tilt_angle_sum: f64,
    /// Number of contiguous excursions into `Unsafe`.
    pub correction_count: u64,
}

impl SessionStats {
    pub fn new(session_id: String, start_time: DateTime<Utc>) -> Self {
        Self {
            session_id,
            start_time,
            sample_count: 0,
            safe_sample_count: 0,
            tilt_angle_sum: 0.0,
            correction_count: 0,
        }
    }

    pub fn upright_percentage(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        self.safe_sample_count as f64 / self.sample_count as f64 * 100.0
    }

    pub fn average_tilt_deg(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        self.tilt_angle_sum / self.sample_count as f64
    }
}

/// Read-only statistics handed off when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedSessionStats {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub sample_count: u64,
    pub safe_sample_count: u64,
    pub correction_count: u64,
    pub upright_percentage: f64,
    pub average_tilt_deg: f64,
    pub samples_dropped: u64,
    pub invalid_samples: u64,
}

impl FinalizedSessionStats {
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds().max(0)
    }
}
