//! Error taxonomy for the posture engine.
//!
//! None of these are fatal to the process. Sample errors drop one sample,
//! calibration errors leave the prior profile active, and session errors
//! report an ordering mistake by the caller.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("invalid sample: {field} = {value}")]
    InvalidSample { field: &'static str, value: f64 },

    #[error("sample timestamp precedes the previous sample")]
    OutOfOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnstableReason {
    TooFewSamples { captured: usize, required: usize },
    WindowTooShort { captured_ms: i64, required_ms: i64 },
    ExcessiveVariance,
}

impl std::fmt::Display for UnstableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnstableReason::TooFewSamples { captured, required } => {
                write!(f, "captured {captured} samples, need at least {required}")
            }
            UnstableReason::WindowTooShort {
                captured_ms,
                required_ms,
            } => write!(
                f,
                "capture window lasted {captured_ms}ms, need at least {required_ms}ms"
            ),
            UnstableReason::ExcessiveVariance => f.write_str("patient moved during capture"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("calibration unstable: {0}")]
    Unstable(UnstableReason),

    #[error("invalid calibration: warning {warning_deg}° must be above 0 and below danger {danger_deg}° (max {max_deg}°)")]
    InvalidCalibration {
        warning_deg: f64,
        danger_deg: f64,
        max_deg: f64,
    },

    #[error("invalid baseline: pitch {pitch_deg}° and roll {roll_deg}° must be finite and within ±180°")]
    InvalidBaseline { pitch_deg: f64, roll_deg: f64 },

    #[error("invalid assessment: {0}")]
    InvalidAssessment(String),

    #[error("threshold {value_deg}° is outside {min_deg}°..={max_deg}°")]
    ThresholdOutOfRange {
        value_deg: f64,
        min_deg: f64,
        max_deg: f64,
    },

    #[error("threshold {0}° must be a whole number of degrees")]
    FractionalThreshold(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session {0} is closed")]
    SessionClosed(String),
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("patient {0} has no calibration profile")]
    NotCalibrated(String),

    #[error("unknown session {0}")]
    UnknownSession(String),

    #[error("session worker failed: {0}")]
    WorkerFailed(String),
}
