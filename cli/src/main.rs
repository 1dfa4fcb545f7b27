//! Anchorage CLI - drives a registry state file from the command line.
//!
//! ```text
//! anchorage init  --state registry.json
//! anchorage apply --state registry.json --script calls.jsonl
//! anchorage show  --state registry.json --anchors 10
//! ```
//!
//! Results go to stdout as JSON; logs go to stderr (`RUST_LOG` overrides the
//! default `info` filter).

mod script;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use anchorage_config::RegistryConfig;
use anchorage_core::{PayoutLedger, Registry, load_state, save_state};

use crate::script::{Outcome, PayoutLine};

#[derive(Debug, Parser)]
#[command(name = "anchorage", version, about = "Role-gated anchor and link registry")]
struct Cli {
    /// Config file. Defaults to ~/.anchorage/config.toml.
    #[arg(long, global = true, env = "ANCHORAGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty registry state file
    Init {
        #[arg(long)]
        state: PathBuf,
    },
    /// Replay a JSON-lines call script and save the result
    Apply {
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        script: PathBuf,
    },
    /// Print a registry snapshot
    Show {
        #[arg(long)]
        state: PathBuf,
        /// Maximum anchors to list
        #[arg(long, default_value = "20")]
        anchors: usize,
        /// Maximum links to list
        #[arg(long, default_value = "20")]
        links: usize,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RegistryConfig> {
    let config = match path {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::load_default()?,
    };
    Ok(config)
}

fn init(config: RegistryConfig, state: &Path) -> Result<()> {
    if state.exists() {
        bail!("state file {} already exists", state.display());
    }
    let registry = Registry::new(config);
    save_state(&registry, state)?;
    tracing::info!(
        "Initialized registry at {} (genesis block {})",
        state.display(),
        registry.config().genesis()
    );
    Ok(())
}

fn apply(config: RegistryConfig, state: &Path, script_path: &Path) -> Result<()> {
    let mut registry = load_state(state, config)?;
    let raw = fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let lines = script::parse(&raw)?;

    let mut payouts = PayoutLedger::default();
    let mut out = io::stdout().lock();
    let (mut accepted, mut rejected) = (0usize, 0usize);

    for (number, line) in &lines {
        let before = registry.events().len() as u64;
        let result = line.op.apply(&mut registry, &line.call(), &mut payouts);
        let error = match result {
            Ok(()) => {
                accepted += 1;
                None
            }
            Err(err) => {
                rejected += 1;
                tracing::debug!("Line {number} ({}) rejected: {err}", line.op.name());
                Some(err.to_string())
            }
        };
        let outcome = Outcome {
            line: *number,
            op: line.op.name(),
            ok: error.is_none(),
            error,
            events: registry.events().since(before),
        };
        serde_json::to_writer(&mut out, &outcome)?;
        writeln!(out)?;
    }

    for payout in payouts.drain() {
        serde_json::to_writer(&mut out, &PayoutLine { payout })?;
        writeln!(out)?;
    }
    out.flush()?;

    save_state(&registry, state)?;
    tracing::info!(
        "Applied {} calls to {} ({accepted} accepted, {rejected} rejected)",
        lines.len(),
        state.display()
    );
    Ok(())
}

fn show(config: RegistryConfig, state: &Path, anchors: usize, links: usize) -> Result<()> {
    let registry = load_state(state, config)?;
    let snapshot = registry.snapshot(anchors, links);
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &snapshot)?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Init { state } => init(config, &state),
        Command::Apply { state, script } => apply(config, &state, &script),
        Command::Show {
            state,
            anchors,
            links,
        } => show(config, &state, anchors, links),
    }
}
