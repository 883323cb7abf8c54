use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CalibrationProfile, CalibrationStatus};

/// One stored version of a patient's calibration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub patient_id: String,
    /// Starts at 1 and increases with every recalibration.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub profile: CalibrationProfile,
}

impl ProfileRecord {
    pub fn new(patient_id: impl Into<String>, version: u32, profile: CalibrationProfile) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            version,
            created_at: Utc::now(),
            profile,
        }
    }

    pub fn status(&self) -> CalibrationStatus {
        CalibrationStatus::Calibrated {
            version: self.version,
        }
    }
}
