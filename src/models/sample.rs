use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SampleError;

/// Orientation limit accepted for pitch, roll and yaw, in degrees.
pub const MAX_ORIENTATION_DEG: f64 = 180.0;

/// A sample as it arrives from the device link. The ingestor stamps it with
/// the arrival time when the device did not supply one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub yaw_deg: f64,
    pub fsr_left: f64,
    pub fsr_right: f64,
}

/// A validated, timestamped orientation and foot-pressure sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub yaw_deg: f64,
    pub fsr_left: f64,
    pub fsr_right: f64,
}

impl SensorSample {
    pub fn new(
        timestamp: DateTime<Utc>,
        pitch_deg: f64,
        roll_deg: f64,
        yaw_deg: f64,
        fsr_left: f64,
        fsr_right: f64,
    ) -> Self {
        Self {
            timestamp,
            pitch_deg,
            roll_deg,
            yaw_deg,
            fsr_left,
            fsr_right,
        }
    }

    pub fn from_raw(raw: RawSample, received_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: raw.timestamp.unwrap_or(received_at),
            pitch_deg: raw.pitch_deg,
            roll_deg: raw.roll_deg,
            yaw_deg: raw.yaw_deg,
            fsr_left: raw.fsr_left,
            fsr_right: raw.fsr_right,
        }
    }

    /// Rejects orientation outside `[-180, 180]`, negative pressure, and
    /// non-finite values of either.
    pub fn validate(&self) -> Result<(), SampleError> {
        let angles = [
            ("pitch", self.pitch_deg),
            ("roll", self.roll_deg),
            ("yaw", self.yaw_deg),
        ];
        for (field, value) in angles {
            if !value.is_finite() || value.abs() > MAX_ORIENTATION_DEG {
                return Err(SampleError::InvalidSample { field, value });
            }
        }

        let pressures = [("fsrLeft", self.fsr_left), ("fsrRight", self.fsr_right)];
        for (field, value) in pressures {
            if !value.is_finite() || value < 0.0 {
                return Err(SampleError::InvalidSample { field, value });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Left,
    Right,
    Center,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Center => "center",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Baseline-corrected lean derived from one `SensorSample`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TiltReading {
    pub timestamp: DateTime<Utc>,
    /// Signed lateral tilt: negative leans left, positive leans right.
    pub tilt_angle_deg: f64,
    pub direction: Direction,
    /// `(right - left) / (left + right)`, in `[-1, 1]`.
    pub balance_ratio: f64,
    /// Baseline-corrected pitch, for display only.
    pub pitch_deg: f64,
}

impl TiltReading {
    pub fn magnitude(&self) -> f64 {
        self.tilt_angle_deg.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn raw_sample_keeps_device_timestamp() {
        let raw = RawSample {
            timestamp: Some(at(5)),
            pitch_deg: 0.5,
            roll_deg: -1.2,
            yaw_deg: 0.8,
            fsr_left: 245.0,
            fsr_right: 267.0,
        };
        let sample = SensorSample::from_raw(raw, at(9));
        assert_eq!(sample.timestamp, at(5));
    }

    #[test]
    fn raw_sample_without_timestamp_is_stamped_on_arrival() {
        let raw: RawSample = serde_json::from_str(
            r#"{"pitchDeg":0.5,"rollDeg":-1.2,"yawDeg":0.8,"fsrLeft":245,"fsrRight":267}"#,
        )
        .unwrap();
        let sample = SensorSample::from_raw(raw, at(9));
        assert_eq!(sample.timestamp, at(9));
        assert_eq!(sample.fsr_right, 267.0);
    }

    #[test]
    fn validate_rejects_out_of_range_orientation() {
        let sample = SensorSample::new(at(0), 0.0, 181.0, 0.0, 1.0, 1.0);
        assert_eq!(
            sample.validate(),
            Err(SampleError::InvalidSample {
                field: "roll",
                value: 181.0
            })
        );

        let boundary = SensorSample::new(at(0), -180.0, 180.0, 180.0, 0.0, 0.0);
        assert!(boundary.validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_pressure_and_nan() {
        let negative = SensorSample::new(at(0), 0.0, 0.0, 0.0, -1.0, 1.0);
        assert!(matches!(
            negative.validate(),
            Err(SampleError::InvalidSample { field: "fsrLeft", .. })
        ));

        let nan = SensorSample::new(at(0), f64::NAN, 0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            nan.validate(),
            Err(SampleError::InvalidSample { field: "pitch", .. })
        ));
    }
}
