//! GridUI Demo - Scripted Sessions Against an In-Memory Host
//!
//! Builds a handful of pages (a framed main menu, a paginated shop and a
//! page drawn over the player inventory) and replays a script of host
//! events against them, printing one JSON line per step.
//!
//! # Usage
//!
//! ```bash
//! # Replay the built-in script
//! gridui-demo
//!
//! # Replay a script file ("-" reads stdin)
//! gridui-demo --script session.txt
//!
//! # With config file
//! gridui-demo --config ~/.config/gridui/gridui.toml
//!
//! # Verbose logging
//! RUST_LOG=debug gridui-demo
//! ```

mod pages;
mod script;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gridui_core::config::{default_config_path, load_config_from_path};
use tracing::{error, info};

use pages::Catalog;
use script::{ScriptRunner, DEFAULT_SCRIPT};

/// GridUI Demo - replay container UI sessions against an in-memory host
#[derive(Parser, Debug)]
#[command(name = "gridui-demo")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Script of host events to replay ("-" for stdin)
    #[arg(short = 's', long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "GRIDUI_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Rows of the demo pages
    #[arg(short = 'r', long, default_value_t = 3)]
    rows: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "GRIDUI_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("gridui_demo={level},gridui_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();
}

fn open_script(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        None => Ok(Box::new(DEFAULT_SCRIPT.as_bytes())),
        Some(path) if path.as_os_str() == "-" => Ok(Box::new(io::stdin().lock())),
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script: {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

fn run(args: &Args) -> Result<usize> {
    let config = load_config_from_path(args.config.clone().or_else(default_config_path))
        .context("Failed to load configuration")?;
    info!(
        source = %config.source(),
        max_slots = config.container.max_slots,
        columns = config.container.columns,
        "Configuration loaded"
    );

    let catalog = Catalog::build(args.rows, &config.container)?;
    let mut runner = ScriptRunner::new(catalog, config.dispatch.clone());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let steps = runner.run(open_script(args.script.as_ref())?, |report| {
        serde_json::to_writer(&mut out, report)?;
        writeln!(out)?;
        Ok(())
    })?;

    let failures = runner.host().failures();
    info!(steps = steps, failures = failures.len(), "Script finished");
    Ok(steps)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("GridUI demo starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!(error = %e, "Demo stopped with error");
            Err(e)
        }
    }
}
