pub mod alert;
pub mod assessment;
pub mod posture;
pub mod profile;
pub mod sample;
pub mod session;

pub use alert::{AlertEvent, AlertKind, FeedbackMode};
pub use assessment::{AssessmentAnswers, MobilityAid, SeverityLevel, StrokeSide, StrokeTimeline, TherapyStatus};
pub use posture::{Classification, LivePosture, PostureState, PostureUpdate};
pub use profile::{Baseline, CalibrationProfile, CalibrationStatus};
pub use sample::{Direction, RawSample, SensorSample, TiltReading};
pub use session::{FinalizedSessionStats, SessionStats, SessionStatus};
