//! Immutable application specification and its validation (§3, §4.A).

pub mod types;
pub mod validate;

pub use types::{ApplicationSpec, File, FileKind, Resources, ServiceSpec, Visibility};
pub use validate::{build_services, validate, ValidationError};
