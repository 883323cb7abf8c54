use serde::{Deserialize, Serialize};

use super::assessment::{MobilityAid, SeverityLevel, StrokeSide, StrokeTimeline, TherapyStatus};

/// Resting orientation captured while the patient sits upright.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

/// Patient-specific baseline and alert thresholds.
///
/// A profile is never mutated once built. Recalibration produces a new
/// version; the previous one stays in the store for audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationProfile {
    pub baseline_pitch: f64,
    pub baseline_roll: f64,
    pub warning_threshold_deg: f64,
    pub danger_threshold_deg: f64,
    pub stroke_side: StrokeSide,
    pub severity_level: SeverityLevel,
    pub mobility_level: MobilityAid,
    pub stroke_timeline: StrokeTimeline,
    pub therapy_status: TherapyStatus,
}

impl CalibrationProfile {
    pub fn baseline(&self) -> Baseline {
        Baseline {
            pitch_deg: self.baseline_pitch,
            roll_deg: self.baseline_roll,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum CalibrationStatus {
    NotCalibrated,
    Calibrated { version: u32 },
}
