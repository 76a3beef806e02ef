//! Feeds an inventory snapshot through a template and commits the result.
//!
//! The template file is re-read on every cycle so edits take effect
//! without a restart. Rendering always goes to an in-memory buffer first;
//! the destination is only touched after the whole render succeeded, so a
//! bad cycle can never clobber a previously good artifact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use minijinja::value::ViaDeserialize;
use minijinja::{context, Environment, UndefinedBehavior};

use crate::error::Result;
use crate::frontend;
use crate::inventory::InventorySnapshot;
use crate::types::ContainerRecord;

/// Where a committed artifact goes.
#[derive(Debug, Clone)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Build the template environment. This is the only process-wide
    /// template state: undefined-variable behavior and the filter set.
    pub fn new(strict: bool) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(if strict {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });
        env.add_filter("port", filter_port);
        env.add_filter("env", filter_env);
        env.add_filter("exposed_addr", filter_exposed_addr);
        env.add_filter("public_local_ports", filter_public_local_ports);
        env.add_filter("name_and_port", filter_name_and_port);
        Self { env }
    }

    /// Render `template_path` against a snapshot. Only publishable
    /// frontends are handed to the template.
    pub fn render(
        &self,
        template_path: &Path,
        snapshot: &InventorySnapshot,
        network: &str,
    ) -> Result<String> {
        let source = fs::read_to_string(template_path)?;
        let ctx = context! {
            fcs => snapshot.publishable(),
            containers => snapshot.containers,
            images => snapshot.images,
            network => network,
        };
        Ok(self.env.render_str(&source, ctx)?)
    }

    /// Render and, on success, commit to the output in one write.
    pub fn render_to(
        &self,
        template_path: &Path,
        snapshot: &InventorySnapshot,
        network: &str,
        output: &Output,
    ) -> Result<()> {
        let artifact = self.render(template_path, snapshot, network)?;
        info!("Successfully rendered template {}", template_path.display());
        commit(&artifact, output)?;
        Ok(())
    }
}

fn commit(artifact: &str, output: &Output) -> Result<()> {
    match output {
        Output::File(path) => {
            fs::write(path, artifact)?;
            info!("Wrote {}", path.display());
        }
        Output::Stdout => {
            io::stdout().write_all(artifact.as_bytes())?;
            info!("Wrote to stdout");
        }
    }
    Ok(())
}

// Filters are pure functions over a raw container record, so templates
// iterating `containers` can do their own address math.

fn filter_port(record: ViaDeserialize<ContainerRecord>) -> Option<String> {
    frontend::resolve_port(&record)
}

fn filter_env(record: ViaDeserialize<ContainerRecord>, key: String) -> Option<String> {
    record.env_var(&key).map(str::to_string)
}

fn filter_exposed_addr(
    record: ViaDeserialize<ContainerRecord>,
    network: String,
) -> Option<String> {
    let ip = record.ip_on(&network)?;
    let port = frontend::resolve_port(&record)?;
    Some(format!("{}:{}", ip, port))
}

fn filter_public_local_ports(record: ViaDeserialize<ContainerRecord>) -> Vec<String> {
    frontend::public_local_ports(&record)
}

fn filter_name_and_port(record: ViaDeserialize<ContainerRecord>) -> Option<String> {
    let port = frontend::resolve_port(&record)?;
    Some(format!("{}:{}", record.name, port))
}
