use crate::error::SampleError;
use crate::models::{CalibrationProfile, Direction, SensorSample, TiltReading};

/// Tilt magnitude below which a reading is reported as `Center`.
pub const CENTER_DEADBAND_DEG: f64 = 0.5;

/// Reported tilt is clamped to this range after baseline subtraction.
pub const MAX_TILT_DEG: f64 = 90.0;

/// Fuses one sample into a baseline-corrected tilt reading.
///
/// Lateral lean is carried by roll. Pitch is baseline-corrected too but only
/// for display; it never feeds classification.
pub fn estimate(
    sample: &SensorSample,
    profile: &CalibrationProfile,
) -> Result<TiltReading, SampleError> {
    sample.validate()?;

    let adj_pitch = sample.pitch_deg - profile.baseline_pitch;
    let adj_roll = sample.roll_deg - profile.baseline_roll;
    let tilt_angle_deg = adj_roll.clamp(-MAX_TILT_DEG, MAX_TILT_DEG);

    Ok(TiltReading {
        timestamp: sample.timestamp,
        tilt_angle_deg,
        direction: direction_for(tilt_angle_deg),
        balance_ratio: balance_ratio(sample.fsr_left, sample.fsr_right),
        pitch_deg: adj_pitch,
    })
}

/// Right-minus-left share of total foot pressure. Zero when unloaded.
pub fn balance_ratio(fsr_left: f64, fsr_right: f64) -> f64 {
    let total = fsr_left + fsr_right;
    if total <= 0.0 {
        return 0.0;
    }
    ((fsr_right - fsr_left) / total).clamp(-1.0, 1.0)
}

pub fn direction_for(tilt_angle_deg: f64) -> Direction {
    if tilt_angle_deg < -CENTER_DEADBAND_DEG {
        Direction::Left
    } else if tilt_angle_deg > CENTER_DEADBAND_DEG {
        Direction::Right
    } else {
        Direction::Center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{build, CalibrationConfig};
    use crate::models::{
        AssessmentAnswers, MobilityAid, SeverityLevel, StrokeSide, StrokeTimeline, TherapyStatus,
    };
    use chrono::Utc;

    fn profile_with_baseline(pitch: f64, roll: f64) -> CalibrationProfile {
        let answers = AssessmentAnswers {
            stroke_side: StrokeSide::Left,
            severity_level: SeverityLevel::new(3).unwrap(),
            mobility_level: MobilityAid::Cane,
            stroke_timeline: StrokeTimeline::Moderate,
            therapy_status: TherapyStatus::Active,
        };
        let mut profile = build(&answers, &CalibrationConfig::default()).unwrap();
        profile.baseline_pitch = pitch;
        profile.baseline_roll = roll;
        profile
    }

    fn sample(pitch: f64, roll: f64, left: f64, right: f64) -> SensorSample {
        SensorSample::new(Utc::now(), pitch, roll, 0.0, left, right)
    }

    #[test]
    fn balance_ratio_matches_reference_reading() {
        let ratio = balance_ratio(245.0, 267.0);
        assert!((ratio - 0.0429).abs() < 1e-4, "ratio was {ratio}");
    }

    #[test]
    fn balance_ratio_is_zero_when_unloaded() {
        assert_eq!(balance_ratio(0.0, 0.0), 0.0);
    }

    #[test]
    fn tilt_is_baseline_corrected_roll() {
        let profile = profile_with_baseline(2.0, -1.5);
        let reading = estimate(&sample(5.0, 8.5, 100.0, 100.0), &profile).unwrap();

        assert_eq!(reading.tilt_angle_deg, 10.0);
        assert_eq!(reading.pitch_deg, 3.0);
        assert_eq!(reading.direction, Direction::Right);
        assert_eq!(reading.balance_ratio, 0.0);
    }

    #[test]
    fn tilt_is_clamped_to_ninety_degrees() {
        let profile = profile_with_baseline(0.0, 20.0);
        let reading = estimate(&sample(0.0, -170.0, 1.0, 1.0), &profile).unwrap();
        assert_eq!(reading.tilt_angle_deg, -90.0);
        assert_eq!(reading.direction, Direction::Left);
    }

    #[test]
    fn direction_deadband() {
        assert_eq!(direction_for(0.0), Direction::Center);
        assert_eq!(direction_for(0.4), Direction::Center);
        assert_eq!(direction_for(-0.5), Direction::Center);
        assert_eq!(direction_for(0.51), Direction::Right);
        assert_eq!(direction_for(-3.0), Direction::Left);
    }

    #[test]
    fn invalid_sample_is_rejected() {
        let profile = profile_with_baseline(0.0, 0.0);
        let result = estimate(&sample(0.0, 0.0, -5.0, 10.0), &profile);
        assert!(matches!(result, Err(SampleError::InvalidSample { .. })));
    }
}
