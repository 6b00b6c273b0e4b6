//! Ignore pattern management for namestamp
//!
//! Supports multiple sources of ignore patterns:
//! 1. Built-in patterns (tool folders, editor and download temp files - always active)
//! 2. .gitignore patterns (optional, disabled by default)
//! 3. .namestampignore patterns (optional, enabled by default)
//! 4. Config-based patterns (additional custom patterns)

use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the project-specific ignore file
pub const IGNORE_FILE: &str = ".namestampignore";

/// Folders owned by tools rather than by the user
const BUILTIN_DIRS: [&str; 4] = [".git", ".obsidian", ".trash", ".namestamp"];

/// Ignore rule manager
///
/// Built-in patterns always win; then .namestampignore, .gitignore and
/// the configured patterns are consulted.
pub struct IgnoreRules {
    /// Watched root directory
    root: PathBuf,

    /// Gitignore patterns (optional)
    gitignore: Option<Gitignore>,

    /// namestamp-specific ignore patterns (optional)
    local: Option<Gitignore>,

    /// Configuration
    config: IgnoreConfig,
}

impl IgnoreRules {
    /// Load ignore rules for a watched root
    pub fn load(root: &Path, config: IgnoreConfig) -> Result<Self> {
        let mut rules = Self {
            root: root.to_path_buf(),
            gitignore: None,
            local: None,
            config,
        };

        rules.reload_ignore_files()?;
        Ok(rules)
    }

    /// Reload ignore files from disk
    pub fn reload_ignore_files(&mut self) -> Result<()> {
        self.gitignore = if self.config.use_gitignore {
            self.build_matcher(".gitignore")?
        } else {
            None
        };

        self.local = if self.config.use_namestampignore {
            self.build_matcher(IGNORE_FILE)?
        } else {
            None
        };

        Ok(())
    }

    fn build_matcher(&self, file_name: &str) -> Result<Option<Gitignore>> {
        let path = self.root.join(file_name);
        if !path.exists() {
            return Ok(None);
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        if let Some(e) = builder.add(&path) {
            return Err(e.into());
        }
        Ok(Some(builder.build()?))
    }

    /// Check if path should be ignored
    ///
    /// Accepts absolute paths under the root or paths relative to it.
    pub fn should_ignore(&self, path: &Path) -> bool {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);

        if is_builtin_ignored(rel) {
            return true;
        }

        for matcher in [&self.local, &self.gitignore].into_iter().flatten() {
            if self.matched_by(matcher, rel) {
                return true;
            }
        }

        let rel_str = rel.to_string_lossy();
        self.config
            .additional_patterns
            .iter()
            .any(|pattern| matches_simple_pattern(&rel_str, pattern))
    }

    /// A path is matched when it or any of its parent directories is
    fn matched_by(&self, matcher: &Gitignore, rel: &Path) -> bool {
        let is_dir = self.root.join(rel).is_dir();
        if matcher.matched(rel, is_dir).is_ignore() {
            return true;
        }

        rel.ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .any(|dir| matcher.matched(dir, true).is_ignore())
    }

    /// Get number of active ignore sources
    pub fn active_sources(&self) -> usize {
        let mut count = 1; // Built-in always active
        if self.gitignore.is_some() {
            count += 1;
        }
        if self.local.is_some() {
            count += 1;
        }
        if !self.config.additional_patterns.is_empty() {
            count += 1;
        }
        count
    }

    /// Get watched root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Tool folders anywhere in the path, plus temp/system file names
fn is_builtin_ignored(rel: &Path) -> bool {
    let in_tool_dir = rel.components().any(|c| {
        let part = c.as_os_str().to_string_lossy();
        BUILTIN_DIRS.contains(&&*part)
    });
    if in_tool_dir {
        return true;
    }

    let filename = rel
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    is_temp_file(&filename)
}

/// Editor swap/backup/lock files, OS metadata and partial downloads
fn is_temp_file(filename: &str) -> bool {
    // Vim swap files
    if [".swp", ".swo", ".swx"].iter().any(|s| filename.ends_with(s)) {
        return true;
    }

    // Backup files and Emacs auto-save/lock files
    if filename.ends_with('~')
        || (filename.starts_with('#') && filename.ends_with('#'))
        || filename.starts_with(".#")
    {
        return true;
    }

    // OS metadata
    if filename == ".DS_Store" || filename.starts_with("._") {
        return true;
    }
    if filename == "Thumbs.db" || filename == "desktop.ini" {
        return true;
    }

    // Downloads and atomic-save scratch files still being written
    [".part", ".crdownload", ".download", ".tmp"]
        .iter()
        .any(|s| filename.ends_with(s))
}

/// Single-`*` glob, or substring match when there is no wildcard
fn matches_simple_pattern(path_str: &str, pattern: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) if !suffix.contains('*') => {
            path_str.starts_with(prefix) && path_str.ends_with(suffix)
        }
        Some(_) => false,
        None => path_str.contains(pattern),
    }
}

/// Ignore configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Use .gitignore patterns (default: false)
    #[serde(default)]
    pub use_gitignore: bool,

    /// Use .namestampignore patterns (default: true)
    #[serde(default = "default_true")]
    pub use_namestampignore: bool,

    /// Additional patterns from config
    #[serde(default)]
    pub additional_patterns: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            use_gitignore: false,
            use_namestampignore: true,
            additional_patterns: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}
