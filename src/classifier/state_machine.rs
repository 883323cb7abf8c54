use crate::models::{CalibrationProfile, Classification, PostureState, TiltReading};

/// Degrees a reading must fall below a threshold before the state steps down.
pub const HYSTERESIS_MARGIN_DEG: f64 = 1.0;

/// Three-state hysteresis machine over tilt magnitude.
///
/// Escalation may skip `Warning`; de-escalation moves one state per reading,
/// so `Unsafe` always passes through `Warning` before `Safe`.
#[derive(Debug, Clone)]
pub struct PostureClassifier {
    state: PostureState,
    warning_deg: f64,
    danger_deg: f64,
}

impl PostureClassifier {
    pub fn new(profile: &CalibrationProfile) -> Self {
        Self {
            state: PostureState::Safe,
            warning_deg: profile.warning_threshold_deg,
            danger_deg: profile.danger_threshold_deg,
        }
    }

    pub fn state(&self) -> PostureState {
        self.state
    }

    pub fn classify(&mut self, reading: &TiltReading) -> Classification {
        let previous = self.state;
        self.state = self.next_state(reading.magnitude());

        Classification {
            state: self.state,
            previous,
            direction: reading.direction,
            tilt_angle_deg: reading.tilt_angle_deg,
            timestamp: reading.timestamp,
        }
    }

    fn next_state(&self, magnitude: f64) -> PostureState {
        match self.state {
            PostureState::Safe => {
                if magnitude >= self.danger_deg {
                    PostureState::Unsafe
                } else if magnitude >= self.warning_deg {
                    PostureState::Warning
                } else {
                    PostureState::Safe
                }
            }
            PostureState::Warning => {
                if magnitude >= self.danger_deg {
                    PostureState::Unsafe
                } else if magnitude < self.warning_deg - HYSTERESIS_MARGIN_DEG {
                    PostureState::Safe
                } else {
                    PostureState::Warning
                }
            }
            PostureState::Unsafe => {
                if magnitude < self.danger_deg - HYSTERESIS_MARGIN_DEG {
                    PostureState::Warning
                } else {
                    PostureState::Unsafe
                }
            }
        }
    }
}
