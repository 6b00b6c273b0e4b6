//! System configuration
//!
//! Loaded once at startup from `<config dir>/namestamp/config.toml`
//! (or the file named by `NAMESTAMP_CONFIG`). A missing file means defaults.
//! Values are fixed for the lifetime of the process.

use anyhow::{Context, Result};
use namestamp_core::{Stamper, DEFAULT_TIMEZONE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use watcher::IgnoreConfig;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "NAMESTAMP_CONFIG";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub watch: WatchConfig,
    pub ignore: IgnoreConfig,
    pub log: LogConfig,
}

/// `[watch]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory watched when none is given on the command line
    pub root: Option<PathBuf>,
    /// Settle time before prompting (default: 200ms)
    pub debounce_ms: u64,
    /// Time between stale-path sweeps (default: 10s)
    pub reap_interval_secs: u64,
    /// IANA zone used for timestamps (default: America/Bogota)
    pub timezone: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: None,
            debounce_ms: 200,
            reap_interval_secs: 10,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// `[log]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Directory for session logs
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl SystemConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(10..=10_000).contains(&self.watch.debounce_ms) {
            anyhow::bail!(
                "watch.debounce_ms must be between 10 and 10000 (got {})",
                self.watch.debounce_ms
            );
        }
        if !(1..=3600).contains(&self.watch.reap_interval_secs) {
            anyhow::bail!(
                "watch.reap_interval_secs must be between 1 and 3600 (got {})",
                self.watch.reap_interval_secs
            );
        }
        Stamper::from_zone_name(&self.watch.timezone).context("watch.timezone is invalid")?;
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            anyhow::bail!(
                "log.level must be one of {} (got {})",
                LOG_LEVELS.join(", "),
                self.log.level
            );
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.watch.reap_interval_secs)
    }

    /// Timestamp generator for the configured zone
    pub fn stamper(&self) -> Result<Stamper> {
        Stamper::from_zone_name(&self.watch.timezone).context("watch.timezone is invalid")
    }

    /// Directory for session logs
    pub fn log_dir(&self) -> PathBuf {
        self.log.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|d| d.join("namestamp").join("logs"))
                .unwrap_or_else(|| std::env::temp_dir().join("namestamp-logs"))
        })
    }

    /// Read one value by dotted key
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "watch.root" => self
                .watch
                .root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "watch.debounce_ms" => self.watch.debounce_ms.to_string(),
            "watch.reap_interval_secs" => self.watch.reap_interval_secs.to_string(),
            "watch.timezone" => self.watch.timezone.clone(),
            "ignore.use_gitignore" => self.ignore.use_gitignore.to_string(),
            "ignore.use_namestampignore" => self.ignore.use_namestampignore.to_string(),
            "ignore.additional_patterns" => self.ignore.additional_patterns.join(","),
            "log.level" => self.log.level.clone(),
            "log.dir" => self.log_dir().display().to_string(),
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'namestamp config list' to see available keys.",
                key
            ),
        };
        Ok(value)
    }

    /// Set one value by dotted key (not validated; call `validate`)
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "watch.root" => {
                self.watch.root = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "watch.debounce_ms" => {
                self.watch.debounce_ms = value
                    .parse()
                    .context("Invalid value: must be a positive integer")?;
            }
            "watch.reap_interval_secs" => {
                self.watch.reap_interval_secs = value
                    .parse()
                    .context("Invalid value: must be a positive integer")?;
            }
            "watch.timezone" => self.watch.timezone = value.to_string(),
            "ignore.use_gitignore" => {
                self.ignore.use_gitignore = value
                    .parse()
                    .context("Invalid value: must be 'true' or 'false'")?;
            }
            "ignore.use_namestampignore" => {
                self.ignore.use_namestampignore = value
                    .parse()
                    .context("Invalid value: must be 'true' or 'false'")?;
            }
            "ignore.additional_patterns" => {
                self.ignore.additional_patterns = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
            }
            "log.level" => self.log.level = value.to_lowercase(),
            "log.dir" => {
                self.log.dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'namestamp config list' to see available keys.",
                key
            ),
        }
        Ok(())
    }
}

/// Keys accepted by `get_value` / `set_value`
pub const KEYS: [&str; 9] = [
    "watch.root",
    "watch.debounce_ms",
    "watch.reap_interval_secs",
    "watch.timezone",
    "ignore.use_gitignore",
    "ignore.use_namestampignore",
    "ignore.additional_patterns",
    "log.level",
    "log.dir",
];

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("namestamp").join("config.toml"))
}

/// Load the config file, or defaults when there is none
pub fn load() -> Result<SystemConfig> {
    match config_file_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(SystemConfig::default()),
    }
}

/// Load and validate a specific file
pub fn load_from(path: &Path) -> Result<SystemConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Save to the default location
pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(config, &path)
}

/// Save to a specific file, creating parent directories
pub fn save_to(config: &SystemConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Write a default config file if none exists, returning its path
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save_to(&SystemConfig::default(), &path)?;
    }
    Ok(path)
}

/// Commented example configuration
pub fn example_config() -> &'static str {
    r#"# namestamp configuration

[watch]
# Directory watched when none is given on the command line
# root = "/home/me/vault"
# Settle time before prompting, in milliseconds (10-10000)
debounce_ms = 200
# Time between stale-path sweeps, in seconds (1-3600)
reap_interval_secs = 10
# IANA zone used for the timestamp in generated names
timezone = "America/Bogota"

[ignore]
use_gitignore = false
use_namestampignore = true
additional_patterns = ["templates/", "*.pdf"]

[log]
# Default filter when RUST_LOG is unset
level = "info"
# dir = "/home/me/.local/share/namestamp/logs"
"#
}
