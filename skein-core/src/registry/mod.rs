//! The container registry (§2 row C, §4.C).

pub mod container;
pub mod types;

pub use container::{CompletionOutcome, ContainerRegistry};
pub use types::{ContainerRecord, ContainerState};
