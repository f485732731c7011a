//! Process wiring for the two node roles

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::actors::heartbeat::{HeartbeatHandle, HeartbeatSettings};
use crate::actors::registry::RegistryHandle;
use crate::config::Config;
use crate::providers::{self, MetricsProvider};
use crate::server::{self, BearerGate, LocalState, MasterState};
use crate::storage::{FileNodeStore, MemoryNodeStore, NodeStore};

fn metrics_gate(config: &Config) -> Option<BearerGate> {
    if config.require_auth {
        Some(BearerGate::new(config.token.as_deref()))
    } else {
        warn!("/metrics is served without authentication");
        None
    }
}

/// A running slave
pub struct SlaveRuntime {
    pub metrics_addr: SocketAddr,
    pub heartbeat: HeartbeatHandle,
}

impl SlaveRuntime {
    pub async fn shutdown(&self) -> Result<()> {
        self.heartbeat.shutdown().await
    }
}

/// Start a slave with the providers enabled in `config`.
pub async fn start_slave(config: &Config) -> Result<SlaveRuntime> {
    start_slave_with(config, providers::local_providers(config)).await
}

/// Start a slave serving `providers`.
///
/// Fails before binding anything if the master URL or token is missing.
pub async fn start_slave_with(
    config: &Config,
    providers: Vec<Arc<dyn MetricsProvider>>,
) -> Result<SlaveRuntime> {
    // validate heartbeat settings before opening the listener
    let mut settings = HeartbeatSettings::from_config(config)?;

    let state = LocalState::new(providers, config.provider_timeout());
    let router = server::local_metrics_routes(state, metrics_gate(config));
    let metrics_addr = server::spawn_server("metrics", config.metrics_addr(), router).await?;

    // announce the port actually bound (differs from config for port 0)
    settings.port = metrics_addr.port();
    let heartbeat = HeartbeatHandle::spawn_with(settings)?;

    info!("slave ready, metrics on {metrics_addr}");
    Ok(SlaveRuntime {
        metrics_addr,
        heartbeat,
    })
}

/// A running master
pub struct MasterRuntime {
    pub metrics_addr: SocketAddr,
    /// Listener of `/heartbeat`; equals `metrics_addr` when shared
    pub heartbeat_addr: SocketAddr,
    pub registry: RegistryHandle,
}

impl MasterRuntime {
    pub async fn shutdown(&self) -> Result<()> {
        self.registry.shutdown().await
    }
}

fn node_store(config: &Config) -> Box<dyn NodeStore> {
    match FileNodeStore::new(&config.node_list_path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("{e}, registry will not survive restarts");
            Box::new(MemoryNodeStore::new())
        }
    }
}

/// Start a master persisting its registry to `config.node_list_path`.
pub async fn start_master(config: &Config) -> Result<MasterRuntime> {
    start_master_with(config, node_store(config)).await
}

pub async fn start_master_with(config: &Config, store: Box<dyn NodeStore>) -> Result<MasterRuntime> {
    if config.token.as_deref().is_none_or(str::is_empty) {
        warn!("no token configured, every heartbeat will be rejected");
    }

    let registry = RegistryHandle::spawn(store).await;
    let state = MasterState::new(registry.clone(), config)?;
    let control_gate = BearerGate::new(config.token.as_deref());

    let aggregation = server::aggregation_routes(state.clone(), metrics_gate(config));
    let control = server::control_routes(state, control_gate);

    let (metrics_addr, heartbeat_addr) = match config.heartbeat_addr() {
        Some(heartbeat_bind) => {
            let heartbeat_addr = server::spawn_server("heartbeat", heartbeat_bind, control).await?;
            let metrics_addr =
                server::spawn_server("aggregation", config.metrics_addr(), aggregation).await?;
            (metrics_addr, heartbeat_addr)
        }
        None => {
            let addr = server::spawn_server(
                "aggregation",
                config.metrics_addr(),
                aggregation.merge(control),
            )
            .await?;
            (addr, addr)
        }
    };

    info!("master ready, metrics on {metrics_addr}, heartbeats on {heartbeat_addr}");
    Ok(MasterRuntime {
        metrics_addr,
        heartbeat_addr,
        registry,
    })
}
