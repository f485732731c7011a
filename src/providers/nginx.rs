//! nginx `stub_status` of the watched containers
//!
//! For each running container of the configured image, the provider
//! resolves the container IP through the Docker API and fetches its
//! `stub_status` page. A container that cannot be reached is logged and
//! left out; the others are still reported.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use tracing::{error, trace};

use super::docker::{Container, DockerClient};
use super::{MetricsProvider, escape_label};

/// Bound for a single stub_status fetch
const STUB_STATUS_TIMEOUT: Duration = Duration::from_secs(2);

static ACTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Active connections:\s*(\d+)").expect("valid regex"));

static COUNTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(\d+)\s+(\d+)\s+(\d+)\s*$").expect("valid regex"));

static STATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Reading:\s*(\d+)\s+Writing:\s*(\d+)\s+Waiting:\s*(\d+)").expect("valid regex")
});

/// Parsed nginx `stub_status` page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StubStatus {
    pub active: u64,
    pub accepted: u64,
    pub handled: u64,
    pub requests: u64,
    pub reading: u64,
    pub writing: u64,
    pub waiting: u64,
}

impl StubStatus {
    /// Parse the plain-text `stub_status` output.
    ///
    /// The active connection count and the reading/writing/waiting line
    /// are required; the accepts/handled/requests counters default to zero
    /// when that line is missing.
    pub fn parse(text: &str) -> Result<Self> {
        let active = ACTIVE
            .captures(text)
            .and_then(|caps| caps[1].parse().ok())
            .context("no active connection count in stub_status")?;

        let states = STATES
            .captures(text)
            .context("no reading/writing/waiting line in stub_status")?;

        let mut status = StubStatus {
            active,
            reading: states[1].parse().unwrap_or_default(),
            writing: states[2].parse().unwrap_or_default(),
            waiting: states[3].parse().unwrap_or_default(),
            ..StubStatus::default()
        };

        if let Some(counters) = COUNTERS.captures(text) {
            status.accepted = counters[1].parse().unwrap_or_default();
            status.handled = counters[2].parse().unwrap_or_default();
            status.requests = counters[3].parse().unwrap_or_default();
        }

        Ok(status)
    }

    /// Render as exposition lines for one container
    pub fn to_prometheus(&self, container: &str, hostname: &str) -> String {
        let labels = format!(
            "{{container=\"{}\",hostname=\"{}\"}}",
            escape_label(container),
            escape_label(hostname)
        );

        [
            ("nginx_active_connections", self.active),
            ("nginx_accepted_connections_total", self.accepted),
            ("nginx_handled_connections_total", self.handled),
            ("nginx_requests_total", self.requests),
            ("nginx_reading", self.reading),
            ("nginx_writing", self.writing),
            ("nginx_waiting", self.waiting),
        ]
        .iter()
        .map(|(name, value)| format!("{name}{labels} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Where to find `stub_status` inside each container
#[derive(Debug, Clone)]
pub struct StubStatusTarget {
    /// Image reference substring selecting the containers
    pub image: String,
    pub port: u16,
    pub path: String,
}

impl StubStatusTarget {
    fn url(&self, ip: &str) -> String {
        format!("http://{ip}:{}{}", self.port, self.path)
    }
}

pub struct NginxProvider {
    docker: DockerClient,
    target: StubStatusTarget,
    hostname: String,
    client: reqwest::Client,
}

impl NginxProvider {
    pub fn new(docker: DockerClient, target: StubStatusTarget, hostname: String) -> Self {
        Self {
            docker,
            target,
            hostname,
            client: reqwest::Client::new(),
        }
    }

    async fn scrape_container(&self, container: &Container) -> Result<String> {
        let ip = self.docker.container_ip(&container.id).await?;
        let url = self.target.url(&ip);
        trace!("fetching stub_status of {} from {url}", container.name);

        let response = self
            .client
            .get(&url)
            .timeout(STUB_STATUS_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("{url} answered {}", response.status());
        }

        let body = response
            .text()
            .await
            .context("failed to read stub_status body")?;

        let status = StubStatus::parse(&body)?;
        Ok(status.to_prometheus(&container.name, &self.hostname))
    }
}

#[async_trait]
impl MetricsProvider for NginxProvider {
    fn name(&self) -> &str {
        "nginx"
    }

    async fn collect(&self) -> Result<String> {
        let containers = self.docker.containers_by_image(&self.target.image).await?;

        let results = join_all(
            containers
                .iter()
                .map(|container| async move { (container, self.scrape_container(container).await) }),
        )
        .await;

        let fragments: Vec<String> = results
            .into_iter()
            .filter_map(|(container, result)| match result {
                Ok(text) => Some(text),
                Err(e) => {
                    error!("failed to fetch stub_status from {}: {:#}", container.name, e);
                    None
                }
            })
            .collect();

        Ok(fragments.join("\n"))
    }
}
