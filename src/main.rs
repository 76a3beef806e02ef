//! Concierge entry point: connect to the runtime, then dispatch to the
//! `list` or `generate` subcommand.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};
use tokio::signal;
use tokio::sync::mpsc;

mod config;
mod error;
mod frontend;
mod inventory;
mod list;
mod notify;
mod render;
mod runtime;
mod types;
mod watch;

use config::Config;
use frontend::SslPolicy;
use notify::Notification;
use render::{Output, Renderer};
use runtime::{ContainerRuntime, DockerRuntime};
use watch::{BuildCycle, GenerateCycle, ReconcileLoop};

#[derive(Parser)]
#[command(
    name = "concierge",
    about = "Generate configuration files based on docker state changes"
)]
struct Cli {
    /// Url used to connect to the docker server.
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Frontend network name.
    #[arg(short, long, global = true)]
    network: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a table of all frontends on the network.
    List,
    /// Render a template from the current container state.
    Generate {
        /// Output file for the rendered template (stdout when omitted).
        #[arg(short, long)]
        output_file: Option<PathBuf>,

        /// Wait for events and rerun after each change.
        #[arg(short, long)]
        watch: bool,

        /// Seconds to wait before updating; reset after each event.
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Restart a container using a signal, e.g. "HUP:nginx".
        #[arg(short = 's', long = "signal", value_name = "SIGNAL:TARGET")]
        notifications: Vec<Notification>,

        /// Value templates see as each frontend's `ssl` field.
        #[arg(long, value_enum)]
        ssl_policy: Option<SslPolicy>,

        /// Template to render.
        template: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut cfg = Config::load()?;
    if let Some(url) = cli.url {
        cfg.url = url;
    }
    if let Some(network) = cli.network {
        cfg.network = network;
    }

    let docker = DockerRuntime::connect(&cfg.url)?;
    let v = docker
        .version()
        .await
        .context("could not reach the container runtime")?;
    info!("Connected to Docker {}, api version {}", v.version, v.api_version);

    match cli.cmd {
        Commands::List => list::run(&docker, &cfg.network, cfg.ssl_policy).await?,
        Commands::Generate {
            output_file,
            watch,
            timeout,
            notifications,
            ssl_policy,
            template,
        } => {
            let settle = Duration::from_secs(timeout.unwrap_or(cfg.timeout));
            let output = match output_file {
                Some(path) => Output::File(path),
                None => Output::Stdout,
            };
            let runtime: Arc<dyn ContainerRuntime> = Arc::new(docker);

            let mut cycle = GenerateCycle {
                runtime: Arc::clone(&runtime),
                network: cfg.network.clone(),
                template,
                output,
                renderer: Renderer::new(cfg.strict_templates),
                notifications,
                ssl: ssl_policy.unwrap_or(cfg.ssl_policy),
            };

            if !watch {
                // One-shot: a single build, fatal on failure.
                cycle.build().await?;
                return Ok(());
            }

            let (tx, rx) = mpsc::unbounded_channel();
            let events_runtime = Arc::clone(&runtime);
            let events_task = tokio::spawn(async move {
                if let Err(e) = events_runtime.events(tx).await {
                    error!("Event subscription failed: {}", e);
                }
            });

            let actions = cfg.events.iter().cloned().collect();
            let mut reconcile = ReconcileLoop::new(rx, settle, actions, cycle);

            tokio::select! {
                res = reconcile.run() => {
                    events_task.abort();
                    res?;
                }
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down...");
                    events_task.abort();
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_accepts_an_ssl_policy_override() {
        let cli = Cli::try_parse_from([
            "concierge",
            "generate",
            "--ssl-policy",
            "off",
            "site.tpl",
        ])
        .unwrap();

        match cli.cmd {
            Commands::Generate {
                ssl_policy,
                template,
                ..
            } => {
                assert_eq!(ssl_policy, Some(SslPolicy::Off));
                assert_eq!(template, PathBuf::from("site.tpl"));
            }
            _ => panic!("expected the generate subcommand"),
        }
    }

    #[test]
    fn ssl_policy_defaults_to_the_config_layer() {
        let cli = Cli::try_parse_from(["concierge", "generate", "site.tpl"]).unwrap();
        match cli.cmd {
            Commands::Generate { ssl_policy, .. } => assert_eq!(ssl_policy, None),
            _ => panic!("expected the generate subcommand"),
        }
    }
}
