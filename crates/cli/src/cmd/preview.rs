//! Show the name a file would get

use anyhow::{Context, Result};
use cli_lib::config::SystemConfig;
use namestamp_core::{FileEntry, NamingSession};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(file: &Path, name: Option<String>, config: &SystemConfig) -> Result<()> {
    let entry = FileEntry::from_path(file)
        .with_context(|| format!("Cannot preview {}", file.display()))?;

    let stamper = config.stamper()?;
    let mut session = NamingSession::new(stamper.stamp(), entry.category());
    if let Some(name) = name {
        session.set_input(name);
    }

    let target = entry.sibling_with(&session.preview());
    println!("{} {}", entry.path.display().dimmed(), "→".dimmed());
    println!("{}", target.display().cyan());

    if target.exists() {
        println!("{}", "A file with this name already exists".yellow());
    }

    Ok(())
}
