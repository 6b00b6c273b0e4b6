//! namestamp CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli_lib::{config, logging};
use std::path::PathBuf;

mod cmd;

/// namestamp - give new files a memorable, timestamped name
#[derive(Parser)]
#[command(name = "namestamp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a directory and prompt for a name for every new file
    Watch {
        /// Directory to watch (default: configured root, else current directory)
        root: Option<PathBuf>,
    },
    /// Show the name a file would get
    Preview {
        /// File to preview
        file: PathBuf,
        /// Name to use (default: the placeholder)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print one value
    Get {
        /// Dotted key, e.g. watch.debounce_ms
        key: String,
    },
    /// Change one value
    Set {
        /// Dotted key, e.g. watch.debounce_ms
        key: String,
        /// New value
        value: String,
    },
    /// Print the config file location
    Path {
        /// Create the file with defaults if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load()?;

    // The naming form owns the terminal while watching
    let _guard = match &cli.command {
        Commands::Watch { .. } => Some(logging::init_file(&config.log_dir(), &config.log.level)?),
        _ => {
            logging::init_stderr(&config.log.level)?;
            None
        }
    };

    match cli.command {
        Commands::Watch { root } => cmd::watch::run(root, &config).await,
        Commands::Preview { file, name } => cmd::preview::run(&file, name, &config),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(&config),
            ConfigCommands::Get { key } => cmd::config::run_get(&config, &key),
            ConfigCommands::Set { key, value } => cmd::config::run_set(config, &key, &value),
            ConfigCommands::Path { create } => cmd::config::run_path(create),
            ConfigCommands::Example => cmd::config::run_example(),
        },
    }
}
