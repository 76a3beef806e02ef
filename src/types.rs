//! Raw data model shared across the generator.
//!
//! Everything here is a plain owned value. A [`ContainerRecord`] is a
//! point-in-time fact snapshot from the runtime; it is superseded wholesale
//! on the next inventory pass, never patched in place. The types derive
//! [`serde`](https://serde.rs/) traits because they end up in the template
//! context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An exposed port as declared in the container's network settings.
///
/// `port` is kept as the string the runtime reported; port resolution
/// deliberately compares these as strings (see [`crate::frontend`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub port: String,
    pub proto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_port: Option<String>,
}

/// Point-in-time facts about one container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    /// Human name with the leading `/` stripped; falls back to the id.
    pub name: String,
    /// Declared environment, split on the first `=`; last entry wins on
    /// duplicate keys.
    pub env: HashMap<String, String>,
    /// Network name -> IP address on that network (no CIDR suffix).
    pub networks: HashMap<String, String>,
    pub ports: Vec<PortSpec>,
}

impl ContainerRecord {
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// IP address on the given network, if the container is attached to it.
    pub fn ip_on(&self, network: &str) -> Option<&str> {
        self.networks.get(network).map(String::as_str)
    }
}

/// Image summary as returned by the runtime's image listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub tags: Vec<String>,
}

/// A network as reported by the runtime's network listing.
#[derive(Debug, Clone)]
pub struct NetworkRef {
    pub id: String,
    pub name: String,
}

/// One fact from the runtime's event stream, decoupled from the wire
/// representation. Consumed exactly once by the debouncer.
#[derive(Debug, Clone)]
pub struct RuntimeEvent {
    /// Event type: `container`, `image`, `network`, ...
    pub kind: String,
    /// Action: `start`, `die`, `create`, ...
    pub action: String,
    /// Id of the object the event is about.
    pub subject: String,
}
