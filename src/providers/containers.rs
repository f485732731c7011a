//! Running containers of the watched image

use async_trait::async_trait;
use tracing::trace;

use super::docker::{Container, DockerClient};
use super::{MetricsProvider, escape_label};

pub struct ContainerProvider {
    docker: DockerClient,
    image: String,
    hostname: String,
}

impl ContainerProvider {
    pub fn new(docker: DockerClient, image: String, hostname: String) -> Self {
        Self {
            docker,
            image,
            hostname,
        }
    }
}

#[async_trait]
impl MetricsProvider for ContainerProvider {
    fn name(&self) -> &str {
        "containers"
    }

    async fn collect(&self) -> anyhow::Result<String> {
        let containers = self.docker.containers_by_image(&self.image).await?;
        trace!("{} containers match {}", containers.len(), self.image);
        Ok(format_containers(&containers, &self.image, &self.hostname))
    }
}

fn format_containers(containers: &[Container], image: &str, hostname: &str) -> String {
    let hostname = escape_label(hostname);

    let mut lines: Vec<String> = containers
        .iter()
        .map(|container| {
            format!(
                "container_running{{container=\"{}\",image=\"{}\",hostname=\"{hostname}\"}} 1",
                escape_label(&container.name),
                escape_label(&container.image),
            )
        })
        .collect();

    lines.push(format!(
        "containers_running_total{{image=\"{}\",hostname=\"{hostname}\"}} {}",
        escape_label(image),
        containers.len()
    ));

    lines.join("\n")
}
