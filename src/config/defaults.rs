//! Defaults merging for archive configurations
//!
//! Every archive is merged in three layers (later wins):
//! 1. Built-in defaults
//! 2. The configuration's shared `[defaults]` sections
//! 3. The archive's own values
//!
//! Lists and scalars are taken whole from the highest layer that declares
//! them, so an explicitly empty list stays empty. Maps are merged key by key.
//! Merging never mutates its inputs; each archive gets its own copy.

use super::loader::{ConfigError, Result};
use super::types::*;
use std::collections::BTreeMap;

/// Environment variable under which the borg repository is exported
pub const BORG_REPO_VAR: &str = "BORG_REPO";

/// Merge one declared archive over the shared defaults
///
/// `index` is the archive's position in the configuration (used in errors).
pub fn normalize_archive(
    index: usize,
    raw: &RawArchive,
    defaults: &ArchiveDefaults,
) -> Result<ArchiveConfig> {
    let borg_raw = raw
        .borg
        .as_ref()
        .ok_or(ConfigError::MissingBorgSection(index))?;

    let borg = merge_borg(index, borg_raw, &defaults.borg)?;

    let rclone_in_use = raw.rclone.as_ref().is_some_and(|r| !r.is_empty())
        || !defaults.rclone.is_empty();
    let empty = RawRcloneSection::default();
    let rclone_raw = raw.rclone.as_ref().unwrap_or(&empty);
    let rclone = merge_rclone(rclone_raw, &defaults.rclone, &borg.repository, rclone_in_use);

    let commands = raw
        .commands
        .iter()
        .map(|(name, cmd)| {
            let mut cmd = cmd.clone();
            cmd.env_vars
                .insert(BORG_REPO_VAR.to_string(), borg.repository.clone());
            (name.clone(), cmd)
        })
        .collect();

    Ok(ArchiveConfig {
        borg,
        rclone,
        commands,
    })
}

/// Normalize every archive of a configuration, failing on the first invalid one
pub fn normalize_archives(config: &Config) -> Result<Vec<ArchiveConfig>> {
    config
        .archives
        .iter()
        .enumerate()
        .map(|(i, raw)| normalize_archive(i + 1, raw, &config.defaults))
        .collect()
}

fn merge_borg(
    index: usize,
    raw: &RawBorgSection,
    defaults: &RawBorgSection,
) -> Result<BorgSection> {
    let repository = pick(&raw.repository, &defaults.repository)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or(ConfigError::MissingRepository(index))?;

    let mut env_vars = merge_maps(&raw.env_vars, &defaults.env_vars);
    env_vars.insert(BORG_REPO_VAR.to_string(), repository.clone());

    Ok(BorgSection {
        source: pick(&raw.source, &defaults.source).unwrap_or_default(),
        exclude: pick(&raw.exclude, &defaults.exclude).unwrap_or_default(),
        archive_name: pick(&raw.archive_name, &defaults.archive_name)
            .unwrap_or_else(default_archive_name)
            .trim()
            .to_string(),
        compression: pick(&raw.compression, &defaults.compression)
            .unwrap_or_else(default_compression)
            .trim()
            .to_string(),
        encryption_mode: pick(&raw.encryption_mode, &defaults.encryption_mode)
            .unwrap_or_else(default_encryption_mode)
            .trim()
            .to_string(),
        commands_extra: ExtraArgs::new(merge_maps(
            &raw.commands_extra,
            &defaults.commands_extra,
        )),
        ignore_commands: pick(&raw.ignore_commands, &defaults.ignore_commands)
            .unwrap_or_default(),
        env_vars,
        run_before: pick(&raw.run_before, &defaults.run_before),
        run_after: pick(&raw.run_after, &defaults.run_after),
        repository,
    })
}

fn merge_rclone(
    raw: &RawRcloneSection,
    defaults: &RawRcloneSection,
    repository: &str,
    in_use: bool,
) -> RcloneSection {
    RcloneSection {
        in_use,
        with_lock: pick(&raw.with_lock, &defaults.with_lock).unwrap_or(false),
        source: repository.to_string(),
        destination: pick(&raw.destination, &defaults.destination)
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        commands_extra: ExtraArgs::new(merge_maps(
            &raw.commands_extra,
            &defaults.commands_extra,
        )),
        ignore_commands: pick(&raw.ignore_commands, &defaults.ignore_commands)
            .unwrap_or_default(),
        env_vars: merge_maps(&raw.env_vars, &defaults.env_vars),
        run_before: pick(&raw.run_before, &defaults.run_before),
        run_after: pick(&raw.run_after, &defaults.run_after),
    }
}

/// Archive value if declared, else the shared default if declared
fn pick<T: Clone>(value: &Option<T>, default: &Option<T>) -> Option<T> {
    value.as_ref().or(default.as_ref()).cloned()
}

fn merge_maps(
    value: &Option<BTreeMap<String, String>>,
    default: &Option<BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let mut merged = default.clone().unwrap_or_default();
    if let Some(value) = value {
        merged.extend(value.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}
