//! # skein-client - The client-side Daemon contract
//!
//! Everything a CLI or other client needs to submit a Skein application to
//! YARN and then talk to its Application Master: submission through the
//! [`yarn::YarnClient`] boundary, a [`pointer::PointerStore`] cache of
//! known applications, and the [`daemon::Daemon`] facade tying the two
//! together (§4.H, §6 Daemon RPC).

pub mod daemon;
pub mod error;
pub mod pointer;
pub mod yarn;

pub use daemon::Daemon;
pub use error::{ClientError, Result};
pub use pointer::{PointerEntry, PointerStore};
pub use yarn::{AmLaunchSpec, ReqwestYarnClient, YarnAppReport, YarnClient};
