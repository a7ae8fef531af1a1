pub mod client;
pub mod heartbeat;
pub mod log;
pub mod registry;

pub use heartbeat::{HeartbeatConfig, HeartbeatMonitor};
pub use registry::{Patch, PatchEntry, PatchNotifier, Registration, RegistryStore, ServiceName};
