//! Utility types and helpers shared across the coordination engines.

pub mod ids;
pub mod serde_helpers;

pub use ids::{ApplicationId, ContainerId, ServiceName};
pub use serde_helpers::duration_serde;
