//! Heartbeat ingestion (master)

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::StatusCode,
};
use tracing::{debug, instrument};

use crate::actors::heartbeat::HeartbeatRequest;
use crate::node::NodeAddress;
use crate::server::error::{ApiError, ApiResult};
use crate::server::state::MasterState;

/// POST /heartbeat
///
/// Registers `<peer ip>:<declared port>`. The host part always comes from
/// the transport connection, never from the request. The body is parsed as
/// JSON whatever the Content-Type says.
#[instrument(skip_all, fields(peer = %peer))]
pub async fn heartbeat(
    State(state): State<MasterState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> ApiResult<(StatusCode, &'static str)> {
    let request: HeartbeatRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid heartbeat body: {e}")))?;

    if request.port == 0 {
        return Err(ApiError::InvalidRequest(String::from(
            "heartbeat port must not be 0",
        )));
    }

    let addr = NodeAddress::from_peer(peer.ip(), request.port);
    let added = state.registry.add(addr.clone()).await?;
    debug!("heartbeat from {addr} (new: {added})");

    Ok((StatusCode::OK, "OK"))
}
