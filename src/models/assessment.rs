//! Clinical intake answers consumed by the calibration builder.
//!
//! Every field is a closed set so the calibration tables are total over
//! their input domain.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrokeSide {
    Left,
    Right,
    Both,
    NotSure,
}

impl StrokeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeSide::Left => "left",
            StrokeSide::Right => "right",
            StrokeSide::Both => "both",
            StrokeSide::NotSure => "not_sure",
        }
    }
}

/// Pusher-syndrome severity on the intake's 1–5 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct SeverityLevel(u8);

impl SeverityLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: u8) -> Result<Self, CalibrationError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(CalibrationError::InvalidAssessment(format!(
                "severity level {level} is outside {}..={}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SeverityLevel {
    type Error = CalibrationError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<SeverityLevel> for u8 {
    fn from(level: SeverityLevel) -> Self {
        level.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MobilityAid {
    Wheelchair,
    Walker,
    Cane,
    Independent,
}

impl MobilityAid {
    pub fn as_str(&self) -> &'static str {
        match self {
            MobilityAid::Wheelchair => "wheelchair",
            MobilityAid::Walker => "walker",
            MobilityAid::Cane => "cane",
            MobilityAid::Independent => "independent",
        }
    }
}

/// Time since stroke, as answered in the intake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrokeTimeline {
    /// Less than 3 months.
    Recent,
    /// 3 to 12 months.
    Moderate,
    /// 1 to 2 years.
    Extended,
    /// More than 2 years.
    Chronic,
}

impl StrokeTimeline {
    /// Representative months since stroke for the bucket.
    pub fn months(&self) -> u32 {
        match self {
            StrokeTimeline::Recent => 2,
            StrokeTimeline::Moderate => 7,
            StrokeTimeline::Extended => 18,
            StrokeTimeline::Chronic => 36,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TherapyStatus {
    Active,
    Intermittent,
    Completed,
    None,
}

impl TherapyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TherapyStatus::Active => "active",
            TherapyStatus::Intermittent => "intermittent",
            TherapyStatus::Completed => "completed",
            TherapyStatus::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentAnswers {
    pub stroke_side: StrokeSide,
    pub severity_level: SeverityLevel,
    pub mobility_level: MobilityAid,
    pub stroke_timeline: StrokeTimeline,
    pub therapy_status: TherapyStatus,
}
