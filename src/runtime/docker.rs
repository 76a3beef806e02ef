use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, KillContainerOptions};
use bollard::image::ListImagesOptions;
use bollard::network::{InspectNetworkOptions, ListNetworksOptions};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::stream::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::time::sleep;

use super::{ContainerRuntime, RuntimeVersion};
use crate::error::Result;
use crate::types::{ContainerRecord, ImageRecord, NetworkRef, PortSpec, RuntimeEvent};

const CONNECT_TIMEOUT_SECS: u64 = 120;
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the daemon at `url` (`unix://...` or `tcp://...`);
    /// anything else falls back to the platform defaults.
    pub fn connect(url: &str) -> Result<Self> {
        let docker = if url.starts_with("unix://") {
            Docker::connect_with_unix(url, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)?
        } else if url.starts_with("tcp://") || url.starts_with("http://") {
            Docker::connect_with_http(url, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)?
        } else {
            Docker::connect_with_local_defaults()?
        };
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn version(&self) -> Result<RuntimeVersion> {
        let v = self.docker.version().await?;
        Ok(RuntimeVersion {
            version: v.version.unwrap_or_default(),
            api_version: v.api_version.unwrap_or_default(),
        })
    }

    async fn list_networks(&self, name: &str) -> Result<Vec<NetworkRef>> {
        let filters: HashMap<String, Vec<String>> =
            [("name".to_string(), vec![name.to_string()])].into();
        let networks = self
            .docker
            .list_networks(Some(ListNetworksOptions { filters }))
            .await?;

        Ok(networks
            .into_iter()
            .filter_map(|n| match (n.id, n.name) {
                (Some(id), Some(name)) => Some(NetworkRef { id, name }),
                _ => None,
            })
            .collect())
    }

    async fn inspect_network(&self, id: &str) -> Result<Vec<String>> {
        let network = self
            .docker
            .inspect_network(id, None::<InspectNetworkOptions<String>>)
            .await?;

        Ok(network
            .containers
            .map(|c| c.into_keys().collect())
            .unwrap_or_default())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerRecord> {
        let detail = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;

        let id = detail.id.unwrap_or_default();
        let name = detail
            .name
            .as_deref()
            .map(|n| n.trim_start_matches('/').to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.clone());

        // Last entry wins on duplicate keys, which HashMap::insert gives us.
        let mut env = HashMap::new();
        if let Some(vars) = detail.config.and_then(|c| c.env) {
            for var in vars {
                if let Some((k, v)) = var.split_once('=') {
                    env.insert(k.to_string(), v.to_string());
                }
            }
        }

        let mut networks = HashMap::new();
        let mut ports = Vec::new();
        if let Some(settings) = detail.network_settings {
            for (net_name, endpoint) in settings.networks.unwrap_or_default() {
                if let Some(ip) = endpoint.ip_address.filter(|ip| !ip.is_empty()) {
                    // Some API versions report the address with a CIDR suffix.
                    let ip = ip.split('/').next().unwrap_or(&ip).to_string();
                    networks.insert(net_name, ip);
                }
            }
            for (key, bindings) in settings.ports.unwrap_or_default() {
                let (port, proto) = match key.split_once('/') {
                    Some((p, proto)) => (p.to_string(), proto.to_string()),
                    None => (key, "tcp".to_string()),
                };
                let binding = bindings.and_then(|b| b.into_iter().next());
                ports.push(PortSpec {
                    port,
                    proto,
                    host_ip: binding.as_ref().and_then(|b| b.host_ip.clone()),
                    host_port: binding.and_then(|b| b.host_port),
                });
            }
        }

        Ok(ContainerRecord {
            id,
            name,
            env,
            networks,
            ports,
        })
    }

    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String>::default()))
            .await?;

        Ok(images
            .into_iter()
            .map(|i| ImageRecord {
                id: i.id,
                tags: i.repo_tags,
            })
            .collect())
    }

    async fn kill(&self, target: &str, signal: &str) -> Result<()> {
        self.docker
            .kill_container(target, Some(KillContainerOptions { signal }))
            .await?;
        Ok(())
    }

    async fn events(&self, tx: mpsc::UnboundedSender<RuntimeEvent>) -> Result<()> {
        loop {
            let mut stream = self.docker.events::<String>(None);
            info!("Listening for runtime events...");

            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(event) => {
                        let ev = RuntimeEvent {
                            kind: event.typ.map(|t| t.to_string()).unwrap_or_default(),
                            action: event.action.unwrap_or_default(),
                            subject: event
                                .actor
                                .and_then(|a| a.id)
                                .unwrap_or_default(),
                        };
                        debug!("Runtime event: {} {}", ev.kind, ev.action);
                        if tx.send(ev).is_err() {
                            // Consumer is gone; we are shutting down.
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        error!("Error in runtime event stream: {}", e);
                        break;
                    }
                }
            }

            if tx.is_closed() {
                return Ok(());
            }
            warn!(
                "Runtime event stream ended, reconnecting in {:?}...",
                RECONNECT_DELAY
            );
            sleep(RECONNECT_DELAY).await;
        }
    }
}
