//! Configuration module for borg-manager
//!
//! This module handles loading configuration units from TOML or JSON files
//! and merging every archive with its defaults.
//!
//! ## Configuration Inheritance
//!
//! Settings are applied in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Shared `[defaults.borg]` / `[defaults.rclone]` sections
//! 3. Archive-level settings
//!
//! ## Example Usage
//!
//! ```no_run
//! use borg_manager::config;
//!
//! let config = config::load_config("backup.toml")?;
//! let archives = config::normalize_archives(&config)?;
//!
//! for archive in archives {
//!     println!("Repository: {}, sources: {:?}", archive.borg.repository, archive.borg.source);
//! }
//! # Ok::<(), config::ConfigError>(())
//! ```

mod defaults;
mod loader;
mod types;

pub use defaults::{normalize_archive, normalize_archives, BORG_REPO_VAR};
pub use loader::{load_config, parse_config, ConfigError, ConfigFormat, Result};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Remote repositories are given as `user@host:path`
pub fn is_remote_repository(repository: &str) -> bool {
    repository.contains('@')
}
