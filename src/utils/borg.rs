//! Borg repository helpers

use crate::config::{expand_tilde, is_remote_repository};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File every borg repository directory carries
pub const REPOSITORY_MARKER_FILE: &str = "config";

/// File holding the repository banner
pub const REPOSITORY_README_FILE: &str = "README";

/// Banner borg writes into the repository README
pub const REPOSITORY_BANNER: &str = "This is a Borg Backup repository";

/// Find a tool binary, preferring an explicit override
///
/// Falls back to the bare name when the binary is not on `PATH`, so the
/// shell reports the missing tool when an action actually needs it.
pub fn resolve_binary(name: &str, configured: Option<&Path>) -> String {
    if let Some(path) = configured {
        return expand_tilde(path).display().to_string();
    }

    match which::which(name) {
        Ok(path) => path.display().to_string(),
        Err(e) => {
            debug!("Binary '{}' not found in PATH: {}", name, e);
            name.to_string()
        }
    }
}

/// Local filesystem location of a repository, `None` for remote ones
pub fn local_path(repository: &str) -> Option<PathBuf> {
    if is_remote_repository(repository) {
        None
    } else {
        Some(expand_tilde(Path::new(repository)))
    }
}

/// Create the directory of a local repository if it doesn't exist
pub fn ensure_local_repository(repository: &str) -> io::Result<()> {
    if repository.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Path can not be empty",
        ));
    }

    if let Some(path) = local_path(repository) {
        if !path.is_dir() {
            debug!("Creating repository directory: {:?}", path);
            fs::create_dir_all(&path)?;
        }
    }

    Ok(())
}

/// Whether a local repository has already been initialized by borg
///
/// Remote repositories always report `false`; their state is only known
/// to borg itself.
pub fn is_initialized(repository: &str) -> bool {
    let Some(path) = local_path(repository) else {
        return false;
    };

    if !path.is_dir() || !path.join(REPOSITORY_MARKER_FILE).is_file() {
        return false;
    }

    fs::read_to_string(path.join(REPOSITORY_README_FILE))
        .map(|readme| readme.contains(REPOSITORY_BANNER))
        .unwrap_or(false)
}

/// Whether `borg init` output says the repository already exists
pub fn reports_existing_repository(output: &str) -> bool {
    let normalized = output
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    normalized.contains("repository already exists")
}
