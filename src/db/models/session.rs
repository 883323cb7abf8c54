use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FinalizedSessionStats, SessionStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub patient_id: String,
    pub profile_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub sample_count: u64,
    pub safe_sample_count: u64,
    pub correction_count: u64,
    pub upright_percentage: f64,
    pub average_tilt_deg: f64,
    pub samples_dropped: u64,
    pub invalid_samples: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn running(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        profile_id: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            patient_id: patient_id.into(),
            profile_id: profile_id.into(),
            status: SessionStatus::Running,
            started_at,
            stopped_at: None,
            sample_count: 0,
            safe_sample_count: 0,
            correction_count: 0,
            upright_percentage: 0.0,
            average_tilt_deg: 0.0,
            samples_dropped: 0,
            invalid_samples: 0,
            created_at: started_at,
            updated_at: started_at,
        }
    }

    /// Statistics of a completed session; `None` while running or when the
    /// session was interrupted.
    pub fn finalized(&self) -> Option<FinalizedSessionStats> {
        if self.status != SessionStatus::Completed {
            return None;
        }
        Some(FinalizedSessionStats {
            session_id: self.id.clone(),
            start_time: self.started_at,
            end_time: self.stopped_at?,
            sample_count: self.sample_count,
            safe_sample_count: self.safe_sample_count,
            correction_count: self.correction_count,
            upright_percentage: self.upright_percentage,
            average_tilt_deg: self.average_tilt_deg,
            samples_dropped: self.samples_dropped,
            invalid_samples: self.invalid_samples,
        })
    }
}
