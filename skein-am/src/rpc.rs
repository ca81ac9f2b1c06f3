//! The Master RPC server (§6): an axum router exposing `MasterState` over
//! HTTP/JSON for `skein-client`'s [`skein_client::Daemon`] and for the
//! cluster's own `/status` tracking UI probe.

// Layer 1: Standard library imports
use std::net::SocketAddr;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

// Layer 3: Internal module imports
use skein_core::api::{
    ErrorBody, GetApplicationSpecResponse, GetContainersQuery, GetContainersResponse,
    GetServiceResponse, KvGetQuery, KvGetResponse, KvListResponse, KvSetRequest, ScaleRequest,
    ShutdownRequest,
};
use skein_core::{ErrorKind, MasterState, ServiceName, SkeinError};

/// Newtype wrapping [`SkeinError`] so we can give it a local
/// `IntoResponse` impl without an orphan-rule violation.
struct RpcError(SkeinError);

impl From<SkeinError> for RpcError {
    fn from(err: SkeinError) -> Self {
        Self(err)
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::FailedPrecondition => StatusCode::CONFLICT,
            ErrorKind::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Cancelled => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            kind: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn service_name(raw: &str) -> Result<ServiceName, RpcError> {
    ServiceName::new(raw).map_err(|_| {
        RpcError(SkeinError::InvalidArgument {
            message: format!("invalid service name '{raw}'"),
        })
    })
}

pub fn router(state: Arc<MasterState>) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/services/{name}", get(get_service))
        .route("/application-spec", get(get_application_spec))
        .route("/containers", get(get_containers))
        .route("/kv/{key}", get(kv_get).post(kv_set).delete(kv_del))
        .route("/kv", get(kv_list))
        .route("/services/{name}/scale", post(scale))
        .route(
            "/services/{name}/instances/{instance}",
            delete(kill_container),
        )
        .route("/shutdown", post(shutdown))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<MasterState>, bind_addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

async fn get_status(State(state): State<Arc<MasterState>>) -> Json<skein_core::ApplicationReport> {
    Json(state.report())
}

async fn get_service(
    State(state): State<Arc<MasterState>>,
    Path(name): Path<String>,
) -> Result<Json<GetServiceResponse>, RpcError> {
    let name = service_name(&name)?;
    let service = state
        .get_service(&name)
        .ok_or_else(|| RpcError(SkeinError::unknown_service(&name)))?;
    Ok(Json(GetServiceResponse { service }))
}

async fn get_application_spec(
    State(state): State<Arc<MasterState>>,
) -> Json<GetApplicationSpecResponse> {
    Json(GetApplicationSpecResponse {
        spec: (*state.get_application_spec()).clone(),
    })
}

async fn get_containers(
    State(state): State<Arc<MasterState>>,
    Query(query): Query<GetContainersQuery>,
) -> Result<Json<GetContainersResponse>, RpcError> {
    let services = query
        .services
        .as_ref()
        .map(|names| {
            names
                .iter()
                .map(|n| service_name(n))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    let containers = state.get_containers(query.states.as_deref(), services.as_deref());
    Ok(Json(GetContainersResponse { containers }))
}

async fn kv_get(
    State(state): State<Arc<MasterState>>,
    Path(key): Path<String>,
    Query(query): Query<KvGetQuery>,
) -> Result<Json<KvGetResponse>, RpcError> {
    let value = state.kv_get(&key, query.wait).await?;
    Ok(Json(KvGetResponse { value }))
}

async fn kv_set(
    State(state): State<Arc<MasterState>>,
    Path(key): Path<String>,
    Json(body): Json<KvSetRequest>,
) -> Result<StatusCode, RpcError> {
    state.kv_set(key, body.value).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn kv_del(
    State(state): State<Arc<MasterState>>,
    Path(key): Path<String>,
) -> StatusCode {
    if state.kv_del(&key) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn kv_list(State(state): State<Arc<MasterState>>) -> Json<KvListResponse> {
    Json(KvListResponse {
        entries: state.kv_list(),
    })
}

async fn scale(
    State(state): State<Arc<MasterState>>,
    Path(name): Path<String>,
    Json(body): Json<ScaleRequest>,
) -> Result<StatusCode, RpcError> {
    let service = service_name(&name)?;
    state.scale(&service, body.instances).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn kill_container(
    State(state): State<Arc<MasterState>>,
    Path((name, instance)): Path<(String, u32)>,
) -> Result<StatusCode, RpcError> {
    let service = service_name(&name)?;
    state.kill_container(&service, instance).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn shutdown(
    State(state): State<Arc<MasterState>>,
    Json(body): Json<ShutdownRequest>,
) -> Result<StatusCode, RpcError> {
    state.shutdown(body.final_status, body.diagnostics).await?;
    Ok(StatusCode::ACCEPTED)
}
