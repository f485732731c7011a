//! Minimal Docker Engine API client over the daemon's unix socket
//!
//! Only the two read-only calls the providers need: list running
//! containers and inspect a container's network settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::trace;

/// Running container as reported by `GET /containers/json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    /// Primary name without the leading slash
    pub name: String,
    pub image: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerSummary {
    id: String,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    image: String,
}

impl From<ContainerSummary> for Container {
    fn from(summary: ContainerSummary) -> Self {
        let name = summary
            .names
            .first()
            .map(|name| name.trim_start_matches('/').to_string())
            .unwrap_or_else(|| summary.id.chars().take(12).collect());

        Container {
            id: summary.id,
            name,
            image: summary.image,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerInspect {
    network_settings: NetworkSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkSettings {
    #[serde(default)]
    networks: BTreeMap<String, EndpointSettings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EndpointSettings {
    #[serde(default, rename = "IPAddress")]
    ip_address: String,
}

#[derive(Debug, Clone)]
pub struct DockerClient {
    socket_path: PathBuf,
}

impl DockerClient {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    /// Running containers whose image reference contains `image`
    pub async fn containers_by_image(&self, image: &str) -> Result<Vec<Container>> {
        let body = self.get("/containers/json?all=false").await?;
        let containers = parse_container_list(&body)?;

        Ok(containers
            .into_iter()
            .filter(|container| container.image.contains(image))
            .collect())
    }

    /// IP address of the container on its first network
    pub async fn container_ip(&self, id: &str) -> Result<String> {
        let body = self.get(&format!("/containers/{id}/json")).await?;
        parse_container_ip(&body)
    }

    #[cfg(unix)]
    async fn get(&self, path: &str) -> Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::UnixStream;

        trace!("docker GET {path}");

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .with_context(|| {
                format!("failed to connect to docker socket {}", self.socket_path.display())
            })?;

        // HTTP/1.0 keeps the daemon from using chunked encoding
        let request = format!("GET {path} HTTP/1.0\r\nHost: localhost\r\n\r\n");

        let (mut reader, mut writer) = stream.into_split();
        writer
            .write_all(request.as_bytes())
            .await
            .context("failed to write docker request")?;
        writer
            .shutdown()
            .await
            .context("failed to finish docker request")?;

        let mut response = Vec::new();
        reader
            .read_to_end(&mut response)
            .await
            .context("failed to read docker response")?;

        let response = String::from_utf8_lossy(&response);
        response_body(&response).map(str::to_string)
    }

    #[cfg(not(unix))]
    async fn get(&self, _path: &str) -> Result<String> {
        anyhow::bail!("docker socket access is only supported on unix")
    }
}

/// Check the status line of a raw HTTP response and return its body.
fn response_body(raw: &str) -> Result<&str> {
    let (head, body) = raw
        .split_once("\r\n\r\n")
        .context("invalid HTTP response from docker")?;

    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .context("missing status line in docker response")?;

    if !(200..300).contains(&status) {
        anyhow::bail!("docker API error: {status}");
    }

    Ok(body)
}

fn parse_container_list(body: &str) -> Result<Vec<Container>> {
    let summaries: Vec<ContainerSummary> =
        serde_json::from_str(body).context("failed to parse container list")?;
    Ok(summaries.into_iter().map(Container::from).collect())
}

fn parse_container_ip(body: &str) -> Result<String> {
    let inspect: ContainerInspect =
        serde_json::from_str(body).context("failed to parse container details")?;

    inspect
        .network_settings
        .networks
        .into_values()
        .map(|endpoint| endpoint.ip_address)
        .find(|ip| !ip.is_empty())
        .context("container has no network address")
}
