use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::{ContainerRecord, ImageRecord, NetworkRef, RuntimeEvent};

pub mod docker;
pub use docker::DockerRuntime;

#[cfg(test)]
pub mod mock;

/// Version facts reported by the runtime daemon.
#[derive(Debug, Clone)]
pub struct RuntimeVersion {
    pub version: String,
    pub api_version: String,
}

/// The container runtime, as far as the generator is concerned.
///
/// One implementation talks to Docker; tests use an in-memory double.
/// Failures surface as [`crate::error::Error::RuntimeUnavailable`] and are
/// never retried here -- retry policy belongs to the caller.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn version(&self) -> Result<RuntimeVersion>;

    /// Networks whose name matches `name` (the runtime filter is a
    /// substring match; callers must still compare exactly).
    async fn list_networks(&self, name: &str) -> Result<Vec<NetworkRef>>;

    /// Ids of the containers attached to a network.
    async fn inspect_network(&self, id: &str) -> Result<Vec<String>>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerRecord>;

    async fn list_images(&self) -> Result<Vec<ImageRecord>>;

    /// Deliver a signal to a container. `signal` is either a symbolic
    /// name (`HUP`) or a decimal number.
    async fn kill(&self, target: &str, signal: &str) -> Result<()>;

    /// Subscribe to the runtime's event stream, forwarding every event
    /// into `tx` until the channel closes. Long-lived; run on its own
    /// task. Must reconnect on transient stream failures rather than
    /// returning.
    async fn events(&self, tx: mpsc::UnboundedSender<RuntimeEvent>) -> Result<()>;
}
