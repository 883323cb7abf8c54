pub mod dispatcher;
pub mod messages;

pub use dispatcher::{AlertConfig, AlertDispatcher};
pub use messages::notification_message;
