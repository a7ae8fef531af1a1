pub mod bootstrap;
pub mod config;
pub mod error;
pub mod providers;
pub mod registry_client;

pub use bootstrap::*;
pub use config::*;
pub use error::*;
pub use providers::*;
pub use registry_client::*;
