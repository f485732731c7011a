//! Registry administration (master)

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::node::NodeAddress;
use crate::server::error::{ApiError, ApiResult};
use crate::server::state::MasterState;

/// GET /nodes
///
/// Registered node addresses in registry order
pub async fn list_nodes(State(state): State<MasterState>) -> ApiResult<Json<Vec<NodeAddress>>> {
    Ok(Json(state.registry.list().await?))
}

/// DELETE /nodes/:addr
pub async fn remove_node(
    State(state): State<MasterState>,
    Path(addr): Path<String>,
) -> ApiResult<StatusCode> {
    if state.registry.remove(NodeAddress::new(addr.clone())).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("node {addr} is not registered")))
    }
}
