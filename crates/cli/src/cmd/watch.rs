//! Watch a directory until Ctrl-C

use anyhow::{Context, Result};
use cli_lib::config::SystemConfig;
use cli_lib::{Session, SessionSummary, TerminalForm, TerminalNotifier};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run(root: Option<PathBuf>, config: &SystemConfig) -> Result<()> {
    let root = match root.or_else(|| config.watch.root.clone()) {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("Cannot watch {}", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let session = Session::start(
        &root,
        config,
        Box::new(TerminalForm::new()),
        Arc::new(TerminalNotifier),
    )?;

    println!("{} {}", "Watching".green().bold(), root.display());
    println!(
        "{}",
        format!("Logs: {}  (Ctrl-C to stop)", config.log_dir().display()).dimmed()
    );

    let summary = session
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    let stats = summary.stats;
    println!();
    println!("{}", "Session summary".bold());
    println!("  {} {}", "renamed:".cyan(), stats.renamed);
    println!("  {} {}", "prompted:".cyan(), stats.prompted);
    println!("  {} {}", "cancelled:".cyan(), stats.cancelled);
    if stats.collisions > 0 {
        println!("  {} {}", "name collisions:".yellow(), stats.collisions);
    }
    if stats.failures > 0 {
        println!("  {} {}", "failed renames:".red(), stats.failures);
    }
    println!(
        "  {} {}",
        "still tracked:".dimmed(),
        summary.tracked.len()
    );
}
