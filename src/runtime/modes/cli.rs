//! CLI mode
//!
//! Offline maintenance commands that work directly on the keys file.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::json;

use crate::cli::{Commands, ConfigCommands};
use crate::config::StaticConfig;
use crate::runtime::lifetime::startup::{expiry_window, sweep_period};
use crate::services::ExpirySweeper;
use crate::storage::{KeyStats, KeyStore};

const DEFAULT_SAMPLE_CONFIG_PATH: &str = "config.example.toml";

/// Run a non-server command
pub fn run_cli(command: Commands, config: &StaticConfig) -> Result<()> {
    match command {
        Commands::Serve => bail!("serve is handled by server mode"),
        Commands::Status { json } => status(config, json),
        Commands::Sweep => sweep(config),
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => generate_config(output_path.as_deref(), force),
    }
}

/// Read-only: never creates, repairs or moves the keys file.
fn status(config: &StaticConfig, as_json: bool) -> Result<()> {
    let path = Path::new(&config.keys.file);
    let records = KeyStore::read_only(path)
        .with_context(|| format!("Cannot read keys file {}", path.display()))?;
    let stats = KeyStats::from_records(&records);

    if as_json {
        let body = json!({
            "total": stats.total,
            "used": stats.used,
            "available": stats.available,
            "file": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{} {}", "Keys file:".bold(), path.display());
        println!("  total:     {}", stats.total.to_string().cyan());
        println!("  used:      {}", stats.used.to_string().yellow());
        println!("  available: {}", stats.available.to_string().green());
    }
    Ok(())
}

fn sweep(config: &StaticConfig) -> Result<()> {
    let expiry = expiry_window(config)?;
    // offline maintenance never repairs a corrupt file
    let store = KeyStore::open(&config.keys.file, true)
        .with_context(|| format!("Cannot open keys file {}", config.keys.file))?;
    let store = std::sync::Arc::new(store);
    let sweeper = ExpirySweeper::new(store.clone(), expiry, sweep_period(config)?);

    let removed = sweeper
        .run_once()
        .map_err(|e| anyhow::anyhow!(e.format_colored()))?;
    println!(
        "{} removed {} expired keys, {} remain",
        "✓".green().bold(),
        removed,
        store.len()
    );
    Ok(())
}

fn generate_config(output_path: Option<&str>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or(DEFAULT_SAMPLE_CONFIG_PATH);
    if Path::new(path).exists() && !force {
        bail!("{} already exists, use --force to overwrite", path);
    }

    std::fs::write(path, StaticConfig::generate_sample_config())
        .with_context(|| format!("Failed to write {}", path))?;
    println!("{} sample configuration written to {}", "✓".green().bold(), path);
    Ok(())
}
