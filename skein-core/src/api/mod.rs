//! Master RPC wire types, shared by `skein-am` and `skein-client`.

pub mod types;

pub use types::{
    ErrorBody, GetApplicationSpecResponse, GetContainersQuery, GetContainersResponse,
    GetServiceResponse, KvGetQuery, KvGetResponse, KvListResponse, KvSetRequest, ScaleRequest,
    ShutdownRequest,
};
