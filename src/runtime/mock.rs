//! In-memory [`ContainerRuntime`] double for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ContainerRuntime, RuntimeVersion};
use crate::error::{Error, Result};
use crate::types::{ContainerRecord, ImageRecord, NetworkRef, RuntimeEvent};

#[derive(Default)]
pub struct MockRuntime {
    pub networks: Vec<NetworkRef>,
    /// Network id -> attached container ids.
    pub attachments: HashMap<String, Vec<String>>,
    pub containers: HashMap<String, ContainerRecord>,
    pub images: Vec<ImageRecord>,
    /// Targets for which `kill` should fail.
    pub failing_kills: Vec<String>,
    /// (signal, target) pairs actually delivered.
    pub delivered: Mutex<Vec<(String, String)>>,
}

impl MockRuntime {
    pub fn with_network(name: &str) -> Self {
        Self {
            networks: vec![NetworkRef {
                id: format!("{}-id", name),
                name: name.to_string(),
            }],
            ..Default::default()
        }
    }

    pub fn add_container(&mut self, network: &str, record: ContainerRecord) {
        self.attachments
            .entry(format!("{}-id", network))
            .or_default()
            .push(record.id.clone());
        self.containers.insert(record.id.clone(), record);
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn version(&self) -> Result<RuntimeVersion> {
        Ok(RuntimeVersion {
            version: "0.0.0-mock".into(),
            api_version: "1.0".into(),
        })
    }

    async fn list_networks(&self, name: &str) -> Result<Vec<NetworkRef>> {
        Ok(self
            .networks
            .iter()
            .filter(|n| n.name.contains(name))
            .cloned()
            .collect())
    }

    async fn inspect_network(&self, id: &str) -> Result<Vec<String>> {
        Ok(self.attachments.get(id).cloned().unwrap_or_default())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerRecord> {
        self.containers
            .get(id)
            .cloned()
            .ok_or_else(|| Error::RuntimeUnavailable(format!("no such container: {}", id)))
    }

    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        Ok(self.images.clone())
    }

    async fn kill(&self, target: &str, signal: &str) -> Result<()> {
        if self.failing_kills.iter().any(|t| t == target) {
            return Err(Error::RuntimeUnavailable(format!(
                "cannot signal {}",
                target
            )));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((signal.to_string(), target.to_string()));
        Ok(())
    }

    async fn events(&self, _tx: mpsc::UnboundedSender<RuntimeEvent>) -> Result<()> {
        // Tests drive the channel directly.
        Ok(())
    }
}
