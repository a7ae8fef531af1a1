pub mod monitor;
pub mod types;

pub use monitor::HeartbeatMonitor;
pub use types::{HeartbeatConfig, ProbeError, TrackedService, Transition};
