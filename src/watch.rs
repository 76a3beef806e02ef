//! The reconciliation loop: consume runtime events, coalesce bursts, and
//! re-run the build cycle once the burst settles.
//!
//! The loop is the sole owner of all debounce state. Events arrive from a
//! producer task through an unbounded channel, so enqueueing never blocks
//! on an in-progress build; anything that arrives mid-build is drained on
//! the next idle pass.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};

use crate::error::Result;
use crate::frontend::SslPolicy;
use crate::inventory;
use crate::notify::{self, Notification};
use crate::render::{Output, Renderer};
use crate::runtime::ContainerRuntime;
use crate::types::RuntimeEvent;

/// Container actions that mark the inventory dirty.
pub const DEFAULT_ACTIONS: &[&str] = &[
    "create", "destroy", "die", "kill", "oom", "pause", "restart", "start", "stop", "unpause",
];

const CONTAINER_EVENT: &str = "container";

/// One full inventory -> render -> notify pass.
#[async_trait]
pub trait BuildCycle: Send {
    async fn build(&mut self) -> Result<()>;
}

/// The production cycle behind `generate`.
pub struct GenerateCycle {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub network: String,
    pub template: PathBuf,
    pub output: Output,
    pub renderer: Renderer,
    pub notifications: Vec<Notification>,
    pub ssl: SslPolicy,
}

#[async_trait]
impl BuildCycle for GenerateCycle {
    async fn build(&mut self) -> Result<()> {
        let snapshot = inventory::fetch(self.runtime.as_ref(), &self.network, self.ssl).await?;
        self.renderer
            .render_to(&self.template, &snapshot, &self.network, &self.output)?;
        // Only a committed render may notify anyone.
        notify::dispatch(self.runtime.as_ref(), &self.notifications).await;
        Ok(())
    }
}

pub struct ReconcileLoop<B> {
    rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    settle: Duration,
    actions: HashSet<String>,
    cycle: B,
}

impl<B: BuildCycle> ReconcileLoop<B> {
    pub fn new(
        rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        settle: Duration,
        actions: HashSet<String>,
        cycle: B,
    ) -> Self {
        Self {
            rx,
            settle,
            actions,
            cycle,
        }
    }

    fn relevant(&self, event: &RuntimeEvent) -> bool {
        event.kind == CONTAINER_EVENT && self.actions.contains(&event.action)
    }

    /// Run one startup build, then watch until the event channel closes.
    ///
    /// The startup build's error propagates (bad configuration must kill
    /// the process before the watch begins); later rebuild failures are
    /// reported and the loop keeps watching with the previous artifact
    /// left in place.
    pub async fn run(&mut self) -> Result<()> {
        self.cycle.build().await?;

        loop {
            // Idle: wait for the first relevant event since the last build.
            let event = match self.rx.recv().await {
                Some(event) => event,
                None => break,
            };
            if !self.relevant(&event) {
                continue;
            }
            debug!("Received container event {} for {}", event.action, event.subject);

            // Settling: every further relevant event slides the deadline.
            let mut deadline = Instant::now() + self.settle;
            loop {
                match timeout_at(deadline, self.rx.recv()).await {
                    Err(_) => break,
                    Ok(None) => return Ok(()),
                    Ok(Some(event)) if self.relevant(&event) => {
                        debug!("Received container event {} for {}", event.action, event.subject);
                        deadline = Instant::now() + self.settle;
                    }
                    // Irrelevant events neither arm nor extend the window.
                    Ok(Some(_)) => {}
                }
            }

            info!("Events settled after {:?}, updating", self.settle);
            if let Err(e) = self.cycle.build().await {
                error!("Build cycle failed, keeping previous output: {}", e);
            }
        }

        info!("Event stream closed, stopping watch");
        Ok(())
    }
}
