use crate::error::CalibrationError;
use crate::models::{AssessmentAnswers, Baseline, CalibrationProfile};

use super::config::CalibrationConfig;

/// Largest baseline offset a sensor can report on either axis.
const MAX_BASELINE_DEG: f64 = 180.0;

/// Builds a profile from intake answers, assuming an upright zero baseline.
pub fn build(
    answers: &AssessmentAnswers,
    config: &CalibrationConfig,
) -> Result<CalibrationProfile, CalibrationError> {
    build_with_baseline(answers, Baseline::default(), config)
}

pub fn build_with_baseline(
    answers: &AssessmentAnswers,
    baseline: Baseline,
    config: &CalibrationConfig,
) -> Result<CalibrationProfile, CalibrationError> {
    check_baseline(&baseline)?;

    let base = config.thresholds_for(answers.severity_level);
    let multiplier = config.mobility.for_aid(answers.mobility_level);

    let profile = CalibrationProfile {
        baseline_pitch: baseline.pitch_deg,
        baseline_roll: baseline.roll_deg,
        warning_threshold_deg: round_tenth(base.warning_deg * multiplier),
        danger_threshold_deg: round_tenth(base.danger_deg * multiplier),
        stroke_side: answers.stroke_side,
        severity_level: answers.severity_level,
        mobility_level: answers.mobility_level,
        stroke_timeline: answers.stroke_timeline,
        therapy_status: answers.therapy_status,
    };

    check_thresholds(&profile, config)?;
    Ok(profile)
}

/// Returns a copy of `profile` with a manually chosen warning threshold.
pub fn with_warning_override(
    profile: &CalibrationProfile,
    warning_deg: f64,
    config: &CalibrationConfig,
) -> Result<CalibrationProfile, CalibrationError> {
    if !warning_deg.is_finite()
        || warning_deg < config.override_min_deg
        || warning_deg > config.override_max_deg
    {
        return Err(CalibrationError::ThresholdOutOfRange {
            value_deg: warning_deg,
            min_deg: config.override_min_deg,
            max_deg: config.override_max_deg,
        });
    }
    // The slider moves in whole degrees.
    if warning_deg.fract() != 0.0 {
        return Err(CalibrationError::FractionalThreshold(warning_deg));
    }

    let updated = CalibrationProfile {
        warning_threshold_deg: warning_deg,
        ..*profile
    };
    check_thresholds(&updated, config)?;
    Ok(updated)
}

fn check_baseline(baseline: &Baseline) -> Result<(), CalibrationError> {
    let in_range = |deg: f64| deg.is_finite() && deg.abs() <= MAX_BASELINE_DEG;
    if in_range(baseline.pitch_deg) && in_range(baseline.roll_deg) {
        Ok(())
    } else {
        Err(CalibrationError::InvalidBaseline {
            pitch_deg: baseline.pitch_deg,
            roll_deg: baseline.roll_deg,
        })
    }
}

fn check_thresholds(
    profile: &CalibrationProfile,
    config: &CalibrationConfig,
) -> Result<(), CalibrationError> {
    let warning = profile.warning_threshold_deg;
    let danger = profile.danger_threshold_deg;

    if warning > 0.0 && warning < danger && danger <= config.max_threshold_deg {
        Ok(())
    } else {
        Err(CalibrationError::InvalidCalibration {
            warning_deg: warning,
            danger_deg: danger,
            max_deg: config.max_threshold_deg,
        })
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
