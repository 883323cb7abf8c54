pub mod builder;
pub mod capture;
pub mod config;

pub use builder::{build, build_with_baseline, with_warning_override};
pub use capture::{capture_baseline, BaselineCapture};
pub use config::{CalibrationConfig, CaptureConfig, MobilityMultipliers, ThresholdPair};
