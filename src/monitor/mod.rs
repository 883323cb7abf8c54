mod controller;
mod handle;

pub use controller::MonitorController;
pub use handle::SessionHandle;
