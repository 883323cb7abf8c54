use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sample::{Direction, SensorSample, TiltReading};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PostureState {
    Safe,
    Warning,
    Unsafe,
}

impl Default for PostureState {
    fn default() -> Self {
        PostureState::Safe
    }
}

impl PostureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureState::Safe => "safe",
            PostureState::Warning => "warning",
            PostureState::Unsafe => "unsafe",
        }
    }
}

impl std::fmt::Display for PostureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output for a single reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub state: PostureState,
    pub previous: PostureState,
    pub direction: Direction,
    pub tilt_angle_deg: f64,
    pub timestamp: DateTime<Utc>,
}

impl Classification {
    pub fn changed(&self) -> bool {
        self.state != self.previous
    }

    pub fn escalated(&self) -> bool {
        self.state > self.previous
    }
}

/// One element of the `subscribe` stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostureUpdate {
    pub state: PostureState,
    pub reading: TiltReading,
}

/// Most recent view of a live session, for dashboards polling instead of
/// subscribing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LivePosture {
    pub timestamp: Option<DateTime<Utc>>,
    pub tilt_angle_deg: f64,
    pub direction: Option<Direction>,
    pub fsr_left: f64,
    pub fsr_right: f64,
    pub balance_ratio: f64,
    pub state: PostureState,
    pub haptic_active: bool,
    pub notification_visible: bool,
}

impl LivePosture {
    pub fn apply(&mut self, sample: &SensorSample, reading: &TiltReading, state: PostureState) {
        self.timestamp = Some(reading.timestamp);
        self.tilt_angle_deg = reading.tilt_angle_deg;
        self.direction = Some(reading.direction);
        self.fsr_left = sample.fsr_left;
        self.fsr_right = sample.fsr_right;
        self.balance_ratio = reading.balance_ratio;
        self.state = state;
    }
}
