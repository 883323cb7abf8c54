pub mod state_machine;

pub use state_machine::{PostureClassifier, HYSTERESIS_MARGIN_DEG};
