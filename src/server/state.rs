//! Shared state passed to route handlers

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::actors::registry::RegistryHandle;
use crate::config::Config;
use crate::node::NodeAddress;
use crate::providers::{MetricsProvider, remote::RemoteNode};

/// State of a slave's `/metrics` route
#[derive(Clone)]
pub struct LocalState {
    pub providers: Arc<Vec<Arc<dyn MetricsProvider>>>,
    pub timeout: Duration,
}

impl LocalState {
    pub fn new(providers: Vec<Arc<dyn MetricsProvider>>, timeout: Duration) -> Self {
        Self {
            providers: Arc::new(providers),
            timeout,
        }
    }
}

/// State of the master's routes
#[derive(Clone)]
pub struct MasterState {
    pub registry: RegistryHandle,

    /// Client for node fetches (carries the fetch timeout)
    pub client: reqwest::Client,

    /// Token the master presents to each slave
    pub token: Option<String>,

    pub timeout: Duration,
}

impl MasterState {
    pub fn new(registry: RegistryHandle, config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            registry,
            client,
            token: config.token.clone(),
            timeout: config.fetch_timeout(),
        })
    }

    /// One provider per registered node, in registry order
    pub fn remote_providers(&self, nodes: Vec<NodeAddress>) -> Vec<Arc<dyn MetricsProvider>> {
        nodes
            .into_iter()
            .map(|addr| {
                Arc::new(RemoteNode::new(addr, self.client.clone(), self.token.clone()))
                    as Arc<dyn MetricsProvider>
            })
            .collect()
    }
}
