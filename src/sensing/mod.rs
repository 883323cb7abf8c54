pub mod controller;
pub mod loop_worker;
pub mod pipeline;
pub mod queue;

pub use controller::SensingController;
pub use loop_worker::{ControlCommand, SessionChannels};
pub use pipeline::{Pipeline, PipelineOutput};
pub use queue::{Enqueued, SampleQueue};
