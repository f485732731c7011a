use std::str::FromStr;

use tracing::warn;

pub const EXPORTER_MODE: &str = "EXPORTER_MODE";
pub const EXPORTER_PORT: &str = "EXPORTER_PORT";
pub const EXPORTER_HEARTBEAT_PORT: &str = "EXPORTER_HEARTBEAT_PORT";
pub const EXPORTER_ADDR: &str = "EXPORTER_ADDR";
pub const EXPORTER_MASTER_URL: &str = "EXPORTER_MASTER_URL";
pub const EXPORTER_TOKEN: &str = "EXPORTER_TOKEN";
pub const EXPORTER_BEAT_INTERVAL: &str = "EXPORTER_BEAT_INTERVAL";
pub const EXPORTER_REQUIRE_AUTH: &str = "EXPORTER_REQUIRE_AUTH";
pub const EXPORTER_NODE_LIST: &str = "EXPORTER_NODE_LIST";
pub const EXPORTER_FETCH_TIMEOUT_MS: &str = "EXPORTER_FETCH_TIMEOUT_MS";
pub const EXPORTER_PROVIDER_TIMEOUT_MS: &str = "EXPORTER_PROVIDER_TIMEOUT_MS";
pub const EXPORTER_PROVIDERS: &str = "EXPORTER_PROVIDERS";
pub const EXPORTER_IMAGE_NAME: &str = "EXPORTER_IMAGE_NAME";
pub const EXPORTER_STUB_STATUS_PORT: &str = "EXPORTER_STUB_STATUS_PORT";
pub const EXPORTER_STUB_STATUS_PATH: &str = "EXPORTER_STUB_STATUS_PATH";
pub const EXPORTER_DOCKER_SOCKET: &str = "EXPORTER_DOCKER_SOCKET";
pub const EXPORTER_HOSTNAME: &str = "EXPORTER_HOSTNAME";
pub const EXPORTER_LOG: &str = "EXPORTER_LOG";

/// Read the process environment, treating empty values as unset.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Parse an environment value, ignoring (and logging) values that do not
/// parse so the lower configuration layer stays in effect.
pub fn parse_env<T, F>(env: F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = env(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparseable value for {name}: {raw:?}");
            None
        }
    }
}

/// Parse a boolean flag (`1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`).
pub fn parse_flag<F>(env: F, name: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = env(name)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("ignoring unparseable flag for {name}: {raw:?}");
            None
        }
    }
}

/// Host name reported in metric labels when none is configured
pub fn default_hostname() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| String::from("unknown"))
}
