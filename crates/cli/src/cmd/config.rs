//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use anyhow::{Context, Result};
use cli_lib::config::{self, SystemConfig, KEYS};
use owo_colors::OwoColorize;

/// List all configuration values
pub fn run_list(config: &SystemConfig) -> Result<()> {
    let config_path = config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    let mut section = "";
    for key in KEYS {
        let (prefix, _) = key.split_once('.').unwrap_or((key, ""));
        if prefix != section {
            if !section.is_empty() {
                println!();
            }
            println!("{}", format!("[{}]", prefix).yellow());
            section = prefix;
        }
        println!("  {} = {}", key.cyan(), config.get_value(key)?);
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  watch.debounce_ms: 10-10000");
    println!("  watch.reap_interval_secs: 1-3600");
    println!("  watch.timezone: IANA zone name, e.g. America/Bogota");
    println!("  log.level: trace, debug, info, warn, error");

    Ok(())
}

/// Get a single configuration value
pub fn run_get(config: &SystemConfig, key: &str) -> Result<()> {
    println!("{}", config.get_value(key)?);
    Ok(())
}

/// Set a configuration value
pub fn run_set(mut config: SystemConfig, key: &str, value: &str) -> Result<()> {
    config.set_value(key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    println!(
        "{}",
        "Note: Restart running watch sessions for changes to take effect".yellow()
    );

    Ok(())
}

/// Show the config file path and optionally create it
pub fn run_path(create: bool) -> Result<()> {
    let config_path = config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    Ok(())
}
