//! Derived, per-cycle view over a container: its publishable address and
//! the policy deciding whether it appears in generated output.
//!
//! A [`FrontendDescriptor`] is computed once from a [`ContainerRecord`]
//! and a target network name, then treated as read-only for the rest of
//! the build cycle.

use clap::ValueEnum;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::types::ContainerRecord;

pub const VIRTUAL_HOST: &str = "VIRTUAL_HOST";
pub const VIRTUAL_PATH: &str = "VIRTUAL_PATH";
pub const HTTP_PORT: &str = "HTTP_PORT";

pub const REASON_NO_VHOST: &str = "no virtual host or path";
pub const REASON_NO_PORT: &str = "no port exposed";

/// Whether frontends are advertised with SSL off, on, or forced.
///
/// Surfaced to templates as the descriptor's `ssl` field. The upstream
/// tooling never settled on a single value, so it is configuration here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SslPolicy {
    Off,
    On,
    Force,
}

impl Default for SslPolicy {
    fn default() -> Self {
        SslPolicy::Force
    }
}

/// Read-only view over one container for one target network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontendDescriptor {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_path: Option<String>,
    pub ssl: SslPolicy,
    pub publishable: bool,
    /// Human-readable reason when not publishable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FrontendDescriptor {
    pub fn from_record(record: &ContainerRecord, network: &str, ssl: SslPolicy) -> Self {
        let virtual_host = record.env_var(VIRTUAL_HOST).map(str::to_string);
        let virtual_path = record.env_var(VIRTUAL_PATH).map(str::to_string);
        let port = resolve_port(record);
        let reason = unpublishable_reason(&virtual_host, &virtual_path, &port);

        FrontendDescriptor {
            id: record.id.clone(),
            name: record.name.clone(),
            ip: record.ip_on(network).map(str::to_string),
            port,
            virtual_host,
            virtual_path,
            ssl,
            publishable: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

/// Resolve the port a container should be reached on.
///
/// Priority: an `HTTP_PORT` environment variable wins outright, with no
/// validation against the ports actually exposed. Otherwise the
/// lexicographically smallest exposed TCP port string is taken -- string
/// order, not numeric, matching the behaviour proxies downstream already
/// depend on. No exposed TCP port means no port.
pub fn resolve_port(record: &ContainerRecord) -> Option<String> {
    if let Some(raw) = record.env_var(HTTP_PORT) {
        return match raw.parse::<u32>() {
            Ok(n) => Some(n.to_string()),
            Err(_) => {
                warn!(
                    "container {} has unparseable {}={:?}, ignoring",
                    record.name, HTTP_PORT, raw
                );
                None
            }
        };
    }

    record
        .ports
        .iter()
        .filter(|p| p.proto == "tcp")
        .map(|p| p.port.as_str())
        .min()
        .map(str::to_string)
}

/// Exposed TCP ports that have a published host port.
pub fn public_local_ports(record: &ContainerRecord) -> Vec<String> {
    record
        .ports
        .iter()
        .filter(|p| p.proto == "tcp" && p.host_port.is_some())
        .map(|p| p.port.clone())
        .collect()
}

fn unpublishable_reason(
    virtual_host: &Option<String>,
    virtual_path: &Option<String>,
    port: &Option<String>,
) -> Option<&'static str> {
    let empty = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);

    if empty(virtual_host) && empty(virtual_path) {
        Some(REASON_NO_VHOST)
    } else if port.is_none() {
        Some(REASON_NO_PORT)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortSpec;

    fn tcp(port: &str) -> PortSpec {
        PortSpec {
            port: port.into(),
            proto: "tcp".into(),
            host_ip: None,
            host_port: None,
        }
    }

    fn record(env: &[(&str, &str)], ports: Vec<PortSpec>) -> ContainerRecord {
        ContainerRecord {
            id: "deadbeef".into(),
            name: "web".into(),
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            networks: [("frontnet".to_string(), "172.18.0.2".to_string())].into(),
            ports,
        }
    }

    #[test]
    fn http_port_env_wins_over_exposed_ports() {
        let rec = record(&[("HTTP_PORT", "8080")], vec![tcp("80"), tcp("443")]);
        assert_eq!(resolve_port(&rec), Some("8080".to_string()));
    }

    #[test]
    fn exposed_ports_pick_lexicographic_minimum() {
        // "80" < "8080" as strings; string order is the contract here.
        let rec = record(&[], vec![tcp("8080"), tcp("80")]);
        assert_eq!(resolve_port(&rec), Some("80".to_string()));
    }

    #[test]
    fn non_tcp_ports_are_ignored() {
        let rec = record(
            &[],
            vec![PortSpec {
                port: "53".into(),
                proto: "udp".into(),
                host_ip: None,
                host_port: None,
            }],
        );
        assert_eq!(resolve_port(&rec), None);
    }

    #[test]
    fn bad_http_port_does_not_fall_back() {
        let rec = record(&[("HTTP_PORT", "eighty")], vec![tcp("80")]);
        assert_eq!(resolve_port(&rec), None);
    }

    #[test]
    fn no_virtual_host_or_path_is_unpublishable_regardless_of_port() {
        let rec = record(&[], vec![tcp("80")]);
        let fc = FrontendDescriptor::from_record(&rec, "frontnet", SslPolicy::Force);
        assert!(!fc.publishable);
        assert_eq!(fc.reason.as_deref(), Some(REASON_NO_VHOST));
    }

    #[test]
    fn virtual_host_without_port_is_unpublishable() {
        let rec = record(&[("VIRTUAL_HOST", "a.example.com")], vec![]);
        let fc = FrontendDescriptor::from_record(&rec, "frontnet", SslPolicy::Force);
        assert!(!fc.publishable);
        assert_eq!(fc.reason.as_deref(), Some(REASON_NO_PORT));
    }

    #[test]
    fn host_and_port_is_publishable() {
        let rec = record(&[("VIRTUAL_HOST", "a.example.com")], vec![tcp("80")]);
        let fc = FrontendDescriptor::from_record(&rec, "frontnet", SslPolicy::On);
        assert!(fc.publishable);
        assert_eq!(fc.reason, None);
        assert_eq!(fc.ip.as_deref(), Some("172.18.0.2"));
        assert_eq!(fc.port.as_deref(), Some("80"));
        assert_eq!(fc.ssl, SslPolicy::On);
    }

    #[test]
    fn virtual_path_alone_satisfies_the_vhost_rule() {
        let rec = record(&[("VIRTUAL_PATH", "/api")], vec![tcp("80")]);
        let fc = FrontendDescriptor::from_record(&rec, "frontnet", SslPolicy::Force);
        assert!(fc.publishable);
    }

    #[test]
    fn public_local_ports_require_a_host_binding() {
        let mut published = tcp("8080");
        published.host_port = Some("80".into());
        let rec = record(&[], vec![tcp("9000"), published]);
        assert_eq!(public_local_ports(&rec), vec!["8080".to_string()]);
    }
}
