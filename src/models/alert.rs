use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::posture::PostureState;
use super::sample::Direction;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackMode {
    None,
    NotificationsOnly,
    HapticOnly,
    Both,
}

impl Default for FeedbackMode {
    fn default() -> Self {
        FeedbackMode::Both
    }
}

impl FeedbackMode {
    pub fn notifications(&self) -> bool {
        matches!(self, FeedbackMode::NotificationsOnly | FeedbackMode::Both)
    }

    pub fn haptics(&self) -> bool {
        matches!(self, FeedbackMode::HapticOnly | FeedbackMode::Both)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    HapticStart,
    HapticStop,
    Notify,
}

/// Feedback decision handed to the delivery collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub level: PostureState,
    pub tilt_angle_deg: f64,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
    /// Present on `Notify` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Suggested auto-hide duration for `Notify`, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_duration_ms: Option<u64>,
}
