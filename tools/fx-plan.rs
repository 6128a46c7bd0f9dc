//! Print the initialization order for a module graph manifest
//!
//! Reads a TOML (or `.json`) manifest listing modules and their
//! dependencies, and prints the order the engine would initialize them in.
//! Missing modules and cycles are reported with a non-zero exit status.
//!
//! Usage:
//!   fx-plan <manifest> [--json] [--log <filter>]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use fx_engine::module::registry::GraphManifest;
use fx_engine::utils::init_logging;

#[derive(Parser, Debug)]
#[command(name = "fx-plan", about = "Plan module initialization order")]
struct Args {
    /// Graph manifest (TOML, or JSON with a .json extension)
    manifest: PathBuf,

    /// Print the order as a JSON array
    #[arg(long)]
    json: bool,

    /// Log filter (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn")]
    log: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(Some(&args.log));

    let manifest = GraphManifest::from_file(&args.manifest)?;
    debug!("Loaded {} modules", manifest.modules.len());

    let plan = manifest
        .plan()
        .with_context(|| format!("Cannot plan {}", args.manifest.display()))?;
    info!("Planned {} modules", plan.len());

    if args.json {
        println!("{}", serde_json::to_string_pretty(plan.order())?);
    } else {
        for (position, module) in plan.iter().enumerate() {
            println!("{:>3}. {}", position + 1, module);
        }
    }
    Ok(())
}
