//! Node addresses as recorded by the master
//!
//! A node is identified by the literal `host:port` string it is reachable
//! under. IPv6 hosts are bracketed (`[::1]:3035`) so the string is always a
//! valid URL authority.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Network address of a registered slave (`host:port`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Wrap an already formatted `host:port` string.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Derive the address of a heartbeat sender from the transport peer IP
    /// and the port it declared.
    ///
    /// IPv4-mapped IPv6 peers (dual-stack listeners) are recorded as plain
    /// IPv4.
    pub fn from_peer(ip: IpAddr, port: u16) -> Self {
        match ip.to_canonical() {
            IpAddr::V4(v4) => Self(format!("{v4}:{port}")),
            IpAddr::V6(v6) => Self(format!("[{v6}]:{port}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of this node's metrics route
    pub fn metrics_url(&self) -> String {
        format!("http://{}/metrics", self.0)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_ipv4_peer() {
        let addr = NodeAddress::from_peer(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), 3035);
        assert_eq!(addr.as_str(), "203.0.113.5:3035");
    }

    #[test]
    fn test_ipv6_peer_is_bracketed() {
        let addr = NodeAddress::from_peer(IpAddr::V6(Ipv6Addr::LOCALHOST), 3035);
        assert_eq!(addr.as_str(), "[::1]:3035");
    }

    #[test]
    fn test_ipv4_mapped_peer_is_canonicalised() {
        let mapped = Ipv4Addr::new(10, 0, 0, 7).to_ipv6_mapped();
        let addr = NodeAddress::from_peer(IpAddr::V6(mapped), 3000);
        assert_eq!(addr.as_str(), "10.0.0.7:3000");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let nodes = vec![NodeAddress::new("10.0.0.1:3035"), NodeAddress::new("[::1]:3035")];
        let json = serde_json::to_string(&nodes).unwrap();
        assert_eq!(json, r#"["10.0.0.1:3035","[::1]:3035"]"#);
    }

    #[test]
    fn test_metrics_url() {
        let addr = NodeAddress::new("[::1]:3035");
        assert_eq!(addr.metrics_url(), "http://[::1]:3035/metrics");

        let url = url::Url::parse(&addr.metrics_url()).unwrap();
        assert_eq!(url.host_str(), Some("[::1]"));
        assert_eq!(url.port(), Some(3035));
        assert_eq!(url.path(), "/metrics");
    }
}
