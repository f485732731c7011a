//! Helper functions for integration tests

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use fleet_exporter::{
    NodeAddress,
    config::{Config, Mode},
    providers::MetricsProvider,
};
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

/// Config listening on a random localhost port, no local providers
pub fn create_test_config(mode: Mode) -> Config {
    Config {
        mode,
        bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        token: Some(TOKEN.to_string()),
        beat_interval_secs: 3600,
        fetch_timeout_ms: 500,
        provider_timeout_ms: 500,
        providers: vec![],
        hostname: Some(String::from("test-host")),
        ..Config::default()
    }
}

pub fn create_slave_config(master: SocketAddr) -> Config {
    Config {
        master_url: Some(format!("http://{master}")),
        ..create_test_config(Mode::Slave)
    }
}

/// Provider returning fixed text
pub struct StaticProvider(pub &'static str);

#[async_trait]
impl MetricsProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn collect(&self) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

pub fn static_providers(text: &'static str) -> Vec<Arc<dyn MetricsProvider>> {
    vec![Arc::new(StaticProvider(text))]
}

pub fn node_of(server: &MockServer) -> NodeAddress {
    NodeAddress::new(server.address().to_string())
}

pub async fn scrape(addr: SocketAddr, token: Option<&str>) -> reqwest::Response {
    let mut request = reqwest::Client::new().get(format!("http://{addr}/metrics"));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    request.send().await.unwrap()
}
