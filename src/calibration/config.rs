use serde::{Deserialize, Serialize};

use crate::models::{MobilityAid, SeverityLevel};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdPair {
    pub warning_deg: f64,
    pub danger_deg: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MobilityMultipliers {
    pub wheelchair: f64,
    pub walker: f64,
    pub cane: f64,
    pub independent: f64,
}

impl MobilityMultipliers {
    pub fn for_aid(&self, aid: MobilityAid) -> f64 {
        match aid {
            MobilityAid::Wheelchair => self.wheelchair,
            MobilityAid::Walker => self.walker,
            MobilityAid::Cane => self.cane,
            MobilityAid::Independent => self.independent,
        }
    }
}

/// Requirements on the upright capture window that yields the baseline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    pub min_samples: usize,
    pub min_window_ms: i64,
    /// Largest population variance of pitch or roll (deg²) still treated
    /// as standing still.
    pub max_variance_deg2: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            min_window_ms: 2_000,
            max_variance_deg2: 4.0,
        }
    }
}

/// Threshold policy tables with tunable values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CalibrationConfig {
    /// Severity 3
    pub moderate: ThresholdPair,
    /// Severity 1 and 2
    pub mild: ThresholdPair,
    /// Severity 4 and 5
    pub severe: ThresholdPair,

    /// Applied to both thresholds after the severity lookup
    pub mobility: MobilityMultipliers,

    pub max_threshold_deg: f64,

    /// Range accepted for a manual warning-threshold override
    pub override_min_deg: f64,
    pub override_max_deg: f64,

    pub capture: CaptureConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            moderate: ThresholdPair {
                warning_deg: 8.0,
                danger_deg: 15.0,
            },
            mild: ThresholdPair {
                warning_deg: 6.0,
                danger_deg: 12.0,
            },
            severe: ThresholdPair {
                warning_deg: 10.0,
                danger_deg: 18.0,
            },
            mobility: MobilityMultipliers {
                wheelchair: 0.8,
                walker: 0.9,
                cane: 1.0,
                independent: 1.1,
            },
            max_threshold_deg: 30.0,
            override_min_deg: 5.0,
            override_max_deg: 20.0,
            capture: CaptureConfig::default(),
        }
    }
}

impl CalibrationConfig {
    /// Severity is ordinal: a bucket lookup, never interpolated.
    pub fn thresholds_for(&self, severity: SeverityLevel) -> ThresholdPair {
        match severity.get() {
            1 | 2 => self.mild,
            3 => self.moderate,
            _ => self.severe,
        }
    }
}
