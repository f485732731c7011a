//! `/metrics` endpoints

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{error, instrument};

use crate::scrape::aggregate;
use crate::server::state::{LocalState, MasterState};

const TEXT_PLAIN: &str = "text/plain; version=0.0.4; charset=utf-8";

fn text_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
}

/// GET /metrics (slave)
///
/// Merged output of the local providers
#[instrument(skip_all)]
pub async fn local_metrics(State(state): State<LocalState>) -> Response {
    text_response(aggregate(&state.providers, state.timeout).await)
}

/// GET /metrics (master)
///
/// Fetches every registered node concurrently and concatenates the bodies
/// in registry order. Unreachable nodes are left out; this route always
/// answers 200.
#[instrument(skip_all)]
pub async fn aggregated_metrics(State(state): State<MasterState>) -> Response {
    let nodes = match state.registry.list().await {
        Ok(nodes) => nodes,
        Err(e) => {
            error!("registry unavailable, serving empty scrape: {:#}", e);
            vec![]
        }
    };

    let providers = state.remote_providers(nodes);
    text_response(aggregate(&providers, state.timeout).await)
}
