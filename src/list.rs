//! The `list` subcommand: a fixed-width table of every frontend on the
//! network, green when publishable and red when not, on stderr.

use colored::Colorize;

use crate::error::Result;
use crate::frontend::SslPolicy;
use crate::inventory;
use crate::runtime::ContainerRuntime;

const COLUMNS: [usize; 5] = [20, 15, 5, 18, 18];
const SPACING: usize = 2;

pub async fn run(runtime: &dyn ContainerRuntime, network: &str, ssl: SslPolicy) -> Result<()> {
    let snapshot = inventory::fetch(runtime, network, ssl).await?;

    eprintln!(
        "{}",
        format_row(&["Container", "IP", "Port", "Virtual Host", "Virtual Path"])
    );
    eprintln!("{}", format_line('='));

    for fc in &snapshot.frontends {
        let row = format_row(&[
            &fc.name,
            fc.ip.as_deref().unwrap_or(""),
            fc.port.as_deref().unwrap_or(""),
            fc.virtual_host.as_deref().unwrap_or(""),
            fc.virtual_path.as_deref().unwrap_or(""),
        ]);
        let row = if fc.publishable {
            row.green()
        } else {
            row.red()
        };
        eprintln!("{}", row);
    }

    Ok(())
}

/// Truncate or pad each column to its fixed width.
fn format_row(cols: &[&str]) -> String {
    let parts: Vec<String> = cols
        .iter()
        .zip(COLUMNS)
        .map(|(col, size)| {
            let mut cell: String = col.chars().take(size).collect();
            while cell.chars().count() < size {
                cell.push(' ');
            }
            cell
        })
        .collect();
    parts.join(&" ".repeat(SPACING))
}

fn format_line(ch: char) -> String {
    let parts: Vec<String> = COLUMNS
        .iter()
        .map(|size| ch.to_string().repeat(*size))
        .collect();
    parts.join(&" ".repeat(SPACING))
}
