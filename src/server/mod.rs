//! HTTP surface of the exporter
//!
//! ## Endpoints
//!
//! Slave:
//! - `GET /metrics` - merged local provider output
//!
//! Master:
//! - `GET /metrics` - merged output of every registered node
//! - `POST /heartbeat` - register `<peer ip>:<port>` (always token-gated)
//! - `GET /nodes` - registered nodes (always token-gated)
//! - `DELETE /nodes/:addr` - forget a node (always token-gated)
//!
//! `/metrics` is token-gated unless `require_auth` is off. Every other path
//! answers 404.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use middleware::auth::BearerGate;
pub use state::{LocalState, MasterState};

use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    Router,
    http::StatusCode,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

fn gated(router: Router, gate: Option<BearerGate>) -> Router {
    match gate {
        // route_layer keeps unknown paths at 404 instead of 401
        Some(gate) => router.route_layer(axum::middleware::from_fn_with_state(
            gate,
            middleware::auth::auth_middleware,
        )),
        None => router,
    }
}

/// Slave `/metrics` over local providers
pub fn local_metrics_routes(state: LocalState, gate: Option<BearerGate>) -> Router {
    let router = Router::new()
        .route("/metrics", get(routes::metrics::local_metrics))
        .with_state(state);

    gated(router, gate)
}

/// Master `/metrics` aggregating all registered nodes
pub fn aggregation_routes(state: MasterState, gate: Option<BearerGate>) -> Router {
    let router = Router::new()
        .route("/metrics", get(routes::metrics::aggregated_metrics))
        .with_state(state);

    gated(router, gate)
}

/// Master heartbeat ingestion and registry administration
pub fn control_routes(state: MasterState, gate: BearerGate) -> Router {
    let router = Router::new()
        .route("/heartbeat", post(routes::heartbeat::heartbeat))
        .route("/nodes", get(routes::nodes::list_nodes))
        .route("/nodes/:addr", delete(routes::nodes::remove_node))
        .with_state(state);

    gated(router, Some(gate))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Add the 404 fallback and request tracing to a fully merged router.
pub fn finish(router: Router) -> Router {
    router
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
}

/// Bind `bind_addr` and serve `router` in a background task.
///
/// Handlers see the transport peer address through `ConnectInfo`.
/// Returns the bound address.
pub async fn spawn_server(
    name: &str,
    bind_addr: SocketAddr,
    router: Router,
) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {name} listener on {bind_addr}"))?;
    let addr = listener.local_addr()?;

    info!("{name} listening on {addr}");

    let app = finish(router).into_make_service_with_connect_info::<SocketAddr>();
    let name = name.to_string();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("{name} server error: {}", e);
        }
    });

    Ok(addr)
}
