use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{trace, warn};

use crate::util::{self, parse_env, parse_flag};

/// Role of this process in the fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Keeps the node registry and aggregates all slaves
    Master,
    /// Serves local metrics and heartbeats to the master
    #[default]
    Slave,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "master" => Ok(Mode::Master),
            "slave" => Ok(Mode::Slave),
            other => anyhow::bail!("unknown mode '{other}'"),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Master => f.write_str("master"),
            Mode::Slave => f.write_str("slave"),
        }
    }
}

/// Local metrics providers that can be enabled on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Host,
    Containers,
    Nginx,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(ProviderKind::Host),
            "containers" | "docker" => Ok(ProviderKind::Containers),
            "nginx" => Ok(ProviderKind::Nginx),
            other => anyhow::bail!("unknown provider '{other}'"),
        }
    }
}

/// Comma separated provider list, as given in the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProviderList(Vec<ProviderKind>);

impl FromStr for ProviderList {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(ProviderKind::from_str)
            .collect::<anyhow::Result<Vec<_>>>()
            .map(ProviderList)
    }
}

/// Process configuration
///
/// Built once at startup from defaults, the config file and the
/// environment, then handed to the components that need it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,

    /// Port of the public `/metrics` endpoint
    pub port: u16,

    /// Separate port for `/heartbeat` on the master (same listener if unset)
    pub heartbeat_port: Option<u16>,

    pub bind_addr: IpAddr,

    /// Base URL of the master (slaves only)
    #[serde(alias = "MASTER_NODE")]
    pub master_url: Option<String>,

    /// Fleet-wide bearer token
    #[serde(alias = "TOKEN")]
    pub token: Option<String>,

    pub beat_interval_secs: u64,

    /// Gate `/metrics` behind the bearer token
    pub require_auth: bool,

    pub node_list_path: PathBuf,

    /// Timeout for node fetches and heartbeats
    pub fetch_timeout_ms: u64,

    /// Timeout for a single local provider collection
    pub provider_timeout_ms: u64,

    pub providers: Vec<ProviderKind>,

    #[serde(alias = "IMAGE_NAME")]
    pub image_name: String,

    #[serde(alias = "STUB_STATUS_PORT")]
    pub stub_status_port: u16,

    #[serde(alias = "STUB_STATUS_URL")]
    pub stub_status_path: String,

    pub docker_socket: PathBuf,

    #[serde(alias = "HOSTNAME")]
    pub hostname: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            port: 3000,
            heartbeat_port: None,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            master_url: None,
            token: None,
            beat_interval_secs: 30,
            require_auth: true,
            node_list_path: PathBuf::from("nodes.json"),
            fetch_timeout_ms: 5000,
            provider_timeout_ms: 5000,
            providers: vec![
                ProviderKind::Host,
                ProviderKind::Containers,
                ProviderKind::Nginx,
            ],
            image_name: String::from("ghcr.io/payt-tec/laravel-fpm:"),
            stub_status_port: 8888,
            stub_status_path: String::from("/metrics"),
            docker_socket: PathBuf::from("/var/run/docker.sock"),
            hostname: None,
        }
    }
}

impl Config {
    /// Load the layered configuration: defaults, then `path`, then `env`.
    ///
    /// A missing or malformed file is not fatal; the defaults stay in place.
    pub fn load<F>(path: &Path, env: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match read_config_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("could not read {}, using defaults: {e:#}", path.display());
                Config::default()
            }
        };

        config.apply_env(env);
        trace!("loaded config: {config:?}");
        config
    }

    /// Override fields from environment variables.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = &env;

        if let Some(mode) = parse_env(env, util::EXPORTER_MODE) {
            self.mode = mode;
        }
        if let Some(port) = parse_env(env, util::EXPORTER_PORT) {
            self.port = port;
        }
        if let Some(port) = parse_env(env, util::EXPORTER_HEARTBEAT_PORT) {
            self.heartbeat_port = Some(port);
        }
        if let Some(addr) = parse_env(env, util::EXPORTER_ADDR) {
            self.bind_addr = addr;
        }
        if let Some(url) = env(util::EXPORTER_MASTER_URL) {
            self.master_url = Some(url);
        }
        if let Some(token) = env(util::EXPORTER_TOKEN) {
            self.token = Some(token);
        }
        if let Some(secs) = parse_env(env, util::EXPORTER_BEAT_INTERVAL) {
            self.beat_interval_secs = secs;
        }
        if let Some(require) = parse_flag(env, util::EXPORTER_REQUIRE_AUTH) {
            self.require_auth = require;
        }
        if let Some(path) = env(util::EXPORTER_NODE_LIST) {
            self.node_list_path = PathBuf::from(path);
        }
        if let Some(ms) = parse_env(env, util::EXPORTER_FETCH_TIMEOUT_MS) {
            self.fetch_timeout_ms = ms;
        }
        if let Some(ms) = parse_env(env, util::EXPORTER_PROVIDER_TIMEOUT_MS) {
            self.provider_timeout_ms = ms;
        }
        if let Some(ProviderList(providers)) = parse_env(env, util::EXPORTER_PROVIDERS) {
            self.providers = providers;
        }
        if let Some(image) = env(util::EXPORTER_IMAGE_NAME) {
            self.image_name = image;
        }
        if let Some(port) = parse_env(env, util::EXPORTER_STUB_STATUS_PORT) {
            self.stub_status_port = port;
        }
        if let Some(path) = env(util::EXPORTER_STUB_STATUS_PATH) {
            self.stub_status_path = path;
        }
        if let Some(socket) = env(util::EXPORTER_DOCKER_SOCKET) {
            self.docker_socket = PathBuf::from(socket);
        }
        if let Some(hostname) = env(util::EXPORTER_HOSTNAME) {
            self.hostname = Some(hostname);
        }
    }

    pub fn metrics_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Address of the dedicated heartbeat listener, if one is configured
    pub fn heartbeat_addr(&self) -> Option<SocketAddr> {
        self.heartbeat_port
            .map(|port| SocketAddr::new(self.bind_addr, port))
    }

    pub fn beat_interval(&self) -> Duration {
        Duration::from_secs(self.beat_interval_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Host name used in metric labels
    pub fn hostname(&self) -> String {
        self.hostname.clone().unwrap_or_else(util::default_hostname)
    }
}

/// Port keys of older config files, read next to the current ones
///
/// `PORT` means different things per role: a slave announces it as its
/// metrics port, a master serves `/heartbeat` on it and the aggregated
/// `/metrics` on `LOCAL_PORT`.
#[derive(Debug, Default, Deserialize)]
struct LegacyPorts {
    port: Option<u16>,
    heartbeat_port: Option<u16>,
    #[serde(rename = "METRICS_PORT")]
    metrics: Option<u16>,
    #[serde(rename = "PORT")]
    public: Option<u16>,
    #[serde(rename = "LOCAL_PORT")]
    local: Option<u16>,
}

impl LegacyPorts {
    /// Fill the ports of `config` that the file only sets through old keys.
    ///
    /// `LOCAL_PORT` only ever appeared in master configs, so its presence
    /// marks the file as one even without a `mode` key.
    fn apply(self, config: &mut Config) {
        let master = config.mode == Mode::Master || self.local.is_some();

        if master {
            if let Some(port) = self.port.or(self.local).or(self.metrics) {
                config.port = port;
            }
            if self.heartbeat_port.is_none() {
                // one listener when both old keys name the same port
                config.heartbeat_port = self.public.filter(|port| *port != config.port);
            }
        } else if let Some(port) = self.port.or(self.metrics).or(self.public) {
            config.port = port;
        }
    }
}

pub fn read_config_file(path: &Path) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("invalid configuration file provided: {e}"))?;

    let legacy: LegacyPorts = serde_json::from_value(value.clone())
        .map_err(|e| anyhow::anyhow!("invalid port in configuration file: {e}"))?;
    let mut config: Config = serde_json::from_value(value)
        .map_err(|e| anyhow::anyhow!("invalid configuration file provided: {e}"))?;

    legacy.apply(&mut config);
    Ok(config)
}
