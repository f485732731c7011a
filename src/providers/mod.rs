//! Metrics providers
//!
//! A provider produces one block of Prometheus exposition text per call.
//! Providers are independent: one failing or hanging never affects the
//! output of the others (see [`crate::scrape::aggregate`]).
//!
//! - [`host::HostProvider`]: host OS statistics
//! - [`containers::ContainerProvider`]: running containers of the watched image
//! - [`nginx::NginxProvider`]: nginx `stub_status` of those containers
//! - [`remote::RemoteNode`]: a slave's `/metrics`, fetched by the master

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{Config, ProviderKind};

pub mod containers;
pub mod docker;
pub mod host;
pub mod nginx;
pub mod remote;

/// Source of Prometheus exposition text
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Name used in log lines
    fn name(&self) -> &str;

    /// Collect the current metrics.
    ///
    /// An empty string means "nothing to report" and is dropped by the
    /// aggregator.
    async fn collect(&self) -> anyhow::Result<String>;
}

/// Build the local providers enabled in `config`, in configured order.
pub fn local_providers(config: &Config) -> Vec<Arc<dyn MetricsProvider>> {
    let hostname = config.hostname();
    let docker = docker::DockerClient::new(&config.docker_socket);

    let mut providers: Vec<Arc<dyn MetricsProvider>> = vec![];
    for kind in &config.providers {
        let provider: Arc<dyn MetricsProvider> = match kind {
            ProviderKind::Host => Arc::new(host::HostProvider::new(hostname.clone())),
            ProviderKind::Containers => Arc::new(containers::ContainerProvider::new(
                docker.clone(),
                config.image_name.clone(),
                hostname.clone(),
            )),
            ProviderKind::Nginx => Arc::new(nginx::NginxProvider::new(
                docker.clone(),
                nginx::StubStatusTarget {
                    image: config.image_name.clone(),
                    port: config.stub_status_port,
                    path: config.stub_status_path.clone(),
                },
                hostname.clone(),
            )),
        };
        debug!("enabled provider {}", provider.name());
        providers.push(provider);
    }

    providers
}

/// Escape a Prometheus label value.
pub(crate) fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
