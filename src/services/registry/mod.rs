//! Registry service module
//!
//! This module contains the service registry implementation split into logical components:
//! - `types`: Registration and patch data structures
//! - `error`: Registry and delivery error types
//! - `store`: The in-memory registration set
//! - `notifier`: Dependency-aware patch fan-out
//! - `http_impl`: HTTP handlers for `/services`

pub mod error;
pub mod http_impl;
pub mod notifier;
pub mod store;
pub mod types;

// Re-export public types for easier access
pub use error::{DeliveryError, RegistryError};
pub use http_impl::{ApiError, create_router, create_router_with_monitor};
pub use notifier::PatchNotifier;
pub use store::RegistryStore;
pub use types::{Patch, PatchEntry, Registration, ServiceName};
