pub mod profile;
pub mod session;

pub use profile::ProfileRecord;
pub use session::SessionRecord;
