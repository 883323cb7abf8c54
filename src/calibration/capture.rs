use chrono::{DateTime, Utc};

use crate::error::{CalibrationError, SampleError, UnstableReason};
use crate::models::{Baseline, SensorSample};

use super::config::CaptureConfig;

/// A baseline is never averaged from fewer samples than this, whatever the
/// configured minimum says.
const MIN_CAPTURE_SAMPLES: usize = 1;

/// Accumulates upright samples and averages them into a baseline.
#[derive(Debug, Clone)]
pub struct BaselineCapture {
    config: CaptureConfig,
    first_at: Option<DateTime<Utc>>,
    last_at: Option<DateTime<Utc>>,
    pitches: Vec<f64>,
    rolls: Vec<f64>,
}

impl BaselineCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            first_at: None,
            last_at: None,
            pitches: Vec::with_capacity(config.min_samples),
            rolls: Vec::with_capacity(config.min_samples),
        }
    }

    pub fn push(&mut self, sample: &SensorSample) -> Result<(), SampleError> {
        sample.validate()?;
        if let Some(last) = self.last_at {
            if sample.timestamp < last {
                return Err(SampleError::OutOfOrder);
            }
        }

        self.first_at.get_or_insert(sample.timestamp);
        self.last_at = Some(sample.timestamp);
        self.pitches.push(sample.pitch_deg);
        self.rolls.push(sample.roll_deg);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn finish(&self) -> Result<Baseline, CalibrationError> {
        let captured = self.len();
        let required = self.config.min_samples.max(MIN_CAPTURE_SAMPLES);
        if captured < required {
            return Err(CalibrationError::Unstable(UnstableReason::TooFewSamples {
                captured,
                required,
            }));
        }

        let captured_ms = match (self.first_at, self.last_at) {
            (Some(first), Some(last)) => (last - first).num_milliseconds(),
            _ => 0,
        };
        if captured_ms < self.config.min_window_ms {
            return Err(CalibrationError::Unstable(UnstableReason::WindowTooShort {
                captured_ms,
                required_ms: self.config.min_window_ms,
            }));
        }

        let (pitch_mean, pitch_var) = mean_and_variance(&self.pitches);
        let (roll_mean, roll_var) = mean_and_variance(&self.rolls);
        if pitch_var > self.config.max_variance_deg2 || roll_var > self.config.max_variance_deg2 {
            return Err(CalibrationError::Unstable(UnstableReason::ExcessiveVariance));
        }

        Ok(Baseline {
            pitch_deg: pitch_mean,
            roll_deg: roll_mean,
        })
    }
}

/// Runs a whole capture window at once.
pub fn capture_baseline(
    samples: &[SensorSample],
    config: CaptureConfig,
) -> Result<Baseline, CalibrationError> {
    let mut capture = BaselineCapture::new(config);
    for sample in samples {
        // Malformed samples are skipped, the same as on the live path.
        let _ = capture.push(sample);
    }
    capture.finish()
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window(count: usize, step_ms: i64, roll: impl Fn(usize) -> f64) -> Vec<SensorSample> {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        (0..count)
            .map(|i| {
                SensorSample::new(
                    start + Duration::milliseconds(step_ms * i as i64),
                    1.0,
                    roll(i),
                    0.0,
                    200.0,
                    200.0,
                )
            })
            .collect()
    }

    #[test]
    fn steady_window_averages_pitch_and_roll() {
        let samples = window(21, 100, |i| if i % 2 == 0 { -1.0 } else { -2.0 });
        let baseline = capture_baseline(&samples, CaptureConfig::default()).unwrap();

        assert_eq!(baseline.pitch_deg, 1.0);
        assert!((baseline.roll_deg - (-1.0 * 11.0 - 2.0 * 10.0) / 21.0).abs() < 1e-9);
    }

    #[test]
    fn too_few_samples_is_unstable() {
        let samples = window(9, 500, |_| 0.0);
        let result = capture_baseline(&samples, CaptureConfig::default());
        assert_eq!(
            result,
            Err(CalibrationError::Unstable(UnstableReason::TooFewSamples {
                captured: 9,
                required: 10
            }))
        );
    }

    #[test]
    fn short_window_is_unstable() {
        let samples = window(20, 50, |_| 0.0);
        let result = capture_baseline(&samples, CaptureConfig::default());
        assert!(matches!(
            result,
            Err(CalibrationError::Unstable(UnstableReason::WindowTooShort { .. }))
        ));
    }

    #[test]
    fn movement_during_capture_is_unstable() {
        let samples = window(20, 200, |i| if i % 2 == 0 { -6.0 } else { 6.0 });
        let result = capture_baseline(&samples, CaptureConfig::default());
        assert_eq!(
            result,
            Err(CalibrationError::Unstable(UnstableReason::ExcessiveVariance))
        );
    }

    #[test]
    fn out_of_order_sample_is_refused() {
        let samples = window(2, 100, |_| 0.0);
        let mut capture = BaselineCapture::new(CaptureConfig::default());
        capture.push(&samples[1]).unwrap();
        assert_eq!(capture.push(&samples[0]), Err(SampleError::OutOfOrder));
        assert_eq!(capture.len(), 1);
    }

    #[test]
    fn minimum_window_is_accepted() {
        // Ten samples whose first and last are exactly 2000ms apart.
        let mut samples = window(10, 200, |_| -1.0);
        samples[9].timestamp += Duration::milliseconds(200);
        assert_eq!(
            (samples[9].timestamp - samples[0].timestamp).num_milliseconds(),
            2_000
        );

        let baseline = capture_baseline(&samples, CaptureConfig::default()).unwrap();
        assert_eq!(baseline.roll_deg, -1.0);
    }

    #[test]
    fn empty_window_is_unstable_even_without_a_minimum() {
        let config = CaptureConfig {
            min_samples: 0,
            min_window_ms: 0,
            ..CaptureConfig::default()
        };
        assert_eq!(
            capture_baseline(&[], config),
            Err(CalibrationError::Unstable(UnstableReason::TooFewSamples {
                captured: 0,
                required: 1
            }))
        );

        let single = window(1, 0, |_| 2.0);
        assert_eq!(capture_baseline(&single, config).unwrap().roll_deg, 2.0);
    }
}
