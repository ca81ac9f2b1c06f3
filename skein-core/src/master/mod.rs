//! `MasterState` and the application status projection it serves.

pub mod report;
pub mod state;

pub use report::{ApplicationReport, ApplicationState};
pub use state::MasterState;
