//! Builds one immutable inventory snapshot per cycle: every container on
//! the target network, resolved into frontend descriptors, plus the raw
//! image list.

use futures_util::future::try_join_all;
use log::{debug, info};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::frontend::{FrontendDescriptor, SslPolicy};
use crate::runtime::ContainerRuntime;
use crate::types::{ContainerRecord, ImageRecord};

/// Output of one builder run. Passed into the render pipeline and
/// discarded; never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct InventorySnapshot {
    pub frontends: Vec<FrontendDescriptor>,
    pub containers: Vec<ContainerRecord>,
    pub images: Vec<ImageRecord>,
}

impl InventorySnapshot {
    pub fn publishable(&self) -> Vec<&FrontendDescriptor> {
        self.frontends.iter().filter(|f| f.publishable).collect()
    }
}

/// Query the runtime and assemble a snapshot for `network`.
///
/// Container details are fetched concurrently (one round trip each is the
/// dominant cost) and the result is stable-sorted by name so output
/// ordering never depends on completion order.
pub async fn fetch(
    runtime: &dyn ContainerRuntime,
    network: &str,
    ssl: SslPolicy,
) -> Result<InventorySnapshot> {
    let net = resolve_network(runtime, network).await?;

    let ids = runtime.inspect_network(&net).await?;
    debug!("Network {:?} has {} attached containers", network, ids.len());

    let mut containers: Vec<ContainerRecord> =
        try_join_all(ids.iter().map(|id| runtime.inspect_container(id))).await?;
    containers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let frontends = containers
        .iter()
        .map(|c| FrontendDescriptor::from_record(c, network, ssl))
        .collect();

    let images = runtime.list_images().await?;

    info!(
        "Collected {} containers and {} images",
        containers.len(),
        images.len()
    );

    Ok(InventorySnapshot {
        frontends,
        containers,
        images,
    })
}

/// Resolve a network name to its id, insisting on exactly one exact match.
async fn resolve_network(runtime: &dyn ContainerRuntime, name: &str) -> Result<String> {
    let mut matches: Vec<_> = runtime
        .list_networks(name)
        .await?
        .into_iter()
        .filter(|n| n.name == name)
        .collect();

    match matches.len() {
        0 => Err(Error::NetworkNotFound(name.to_string())),
        1 => Ok(matches.remove(0).id),
        _ => Err(Error::AmbiguousNetwork(name.to_string())),
    }
}
