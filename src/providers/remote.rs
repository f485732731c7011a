//! A registered slave, seen from the master
//!
//! Wrapping each node as a provider lets the master's scrape go through the
//! same aggregator as a slave's local providers.

use anyhow::Context;
use async_trait::async_trait;
use tracing::trace;

use super::MetricsProvider;
use crate::node::NodeAddress;

pub struct RemoteNode {
    addr: NodeAddress,
    /// Shared client; carries the fetch timeout
    client: reqwest::Client,
    token: Option<String>,
}

impl RemoteNode {
    pub fn new(addr: NodeAddress, client: reqwest::Client, token: Option<String>) -> Self {
        Self {
            addr,
            client,
            token,
        }
    }
}

#[async_trait]
impl MetricsProvider for RemoteNode {
    fn name(&self) -> &str {
        self.addr.as_str()
    }

    /// Fetch the node's `/metrics` body verbatim.
    async fn collect(&self) -> anyhow::Result<String> {
        let url = self.addr.metrics_url();
        trace!("requesting metrics from {url}");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("failed to send HTTP request")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        response
            .text()
            .await
            .context("failed to read response body")
    }
}
