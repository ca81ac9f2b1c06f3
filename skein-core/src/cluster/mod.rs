//! The abstract cluster interface and its in-memory test double (§6).

pub mod fake;
pub mod traits;

pub use fake::FakeCluster;
pub use traits::{
    Allocated, ClusterError, ClusterEvents, ClusterInterface, Completed, FinalStatus,
    LaunchContext, ResourceRequest,
};
