//! Fluent API for building test configurations
//!
//! Local repositories are placed in a temporary directory owned by the
//! builder; keep it alive with [`ConfigBuilder::persist`] when the test
//! touches the filesystem.

use borg_manager::config::{
    ArchiveDefaults, Config, CustomCommand, EmailConfig, Gate, RawArchive, RawBorgSection,
    RawRcloneSection, Recipients,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    config: Config,
}

impl ConfigBuilder {
    /// Empty configuration using bare `borg` and `rclone` binaries
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            config: Config {
                borg_bin: Some(PathBuf::from("borg")),
                rclone_bin: Some(PathBuf::from("rclone")),
                ..Default::default()
            },
        }
    }

    /// Remote archives `user@backup:repo1`, `user@backup:repo2`, ...
    pub fn with_remote_archives(count: usize) -> Self {
        (1..=count).fold(Self::new(), |builder, i| {
            builder.add_archive(ArchiveBuilder::new(&format!("user@backup:repo{}", i)))
        })
    }

    pub fn with_default_actions(mut self, actions: &[&str]) -> Self {
        self.config.default_actions = actions.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_borg_bin(mut self, path: &Path) -> Self {
        self.config.borg_bin = Some(path.to_path_buf());
        self
    }

    pub fn with_rclone_bin(mut self, path: &Path) -> Self {
        self.config.rclone_bin = Some(path.to_path_buf());
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.config.log_level = Some(level.to_string());
        self
    }

    pub fn with_email_log_level(mut self, level: &str) -> Self {
        self.config.email_log_level = Some(level.to_string());
        self
    }

    /// Email via local sendmail to `to`
    pub fn with_email(mut self, to: &str) -> Self {
        self.config.email = Some(EmailConfig {
            enabled: true,
            from: "backup@example.org".to_string(),
            to: Recipients::One(to.to_string()),
            subject: "Backup report".to_string(),
            smtp: None,
        });
        self
    }

    pub fn with_defaults(mut self, defaults: ArchiveDefaults) -> Self {
        self.config.defaults = defaults;
        self
    }

    pub fn add_archive(mut self, archive: ArchiveBuilder) -> Self {
        self.config.archives.push(archive.build());
        self
    }

    /// Archive whose repository lives in the temp dir under `name`
    pub fn add_local_archive(self, name: &str) -> Self {
        let repository = self.repository_path(name).display().to_string();
        self.add_archive(ArchiveBuilder::new(&repository))
    }

    /// Where [`add_local_archive`](Self::add_local_archive) puts `name`
    pub fn repository_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join("repos").join(name)
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Build the Config
    pub fn build(self) -> Config {
        self.config
    }

    /// Keep the temp directory (don't delete on drop)
    pub fn persist(self) -> (Config, TempDir) {
        (self.config, self.temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one archive record
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    archive: RawArchive,
}

impl ArchiveBuilder {
    pub fn new(repository: &str) -> Self {
        Self {
            archive: RawArchive {
                borg: Some(RawBorgSection {
                    repository: Some(repository.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    /// Archive without a borg section
    pub fn without_borg() -> Self {
        Self {
            archive: RawArchive::default(),
        }
    }

    fn borg(&mut self) -> &mut RawBorgSection {
        self.archive.borg.get_or_insert_with(Default::default)
    }

    fn rclone(&mut self) -> &mut RawRcloneSection {
        self.archive.rclone.get_or_insert_with(Default::default)
    }

    pub fn with_sources(mut self, sources: &[&str]) -> Self {
        self.borg().source = Some(sources.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_excludes(mut self, excludes: &[&str]) -> Self {
        self.borg().exclude = Some(excludes.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_encryption_mode(mut self, mode: &str) -> Self {
        self.borg().encryption_mode = Some(mode.to_string());
        self
    }

    pub fn with_borg_extra(mut self, command: &str, args: &str) -> Self {
        self.borg()
            .commands_extra
            .get_or_insert_with(BTreeMap::new)
            .insert(command.to_string(), args.to_string());
        self
    }

    pub fn with_borg_env(mut self, key: &str, value: &str) -> Self {
        self.borg()
            .env_vars
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn ignoring_borg(mut self, commands: &[&str]) -> Self {
        self.borg().ignore_commands = Some(commands.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn borg_run_before(mut self, gate: Gate) -> Self {
        self.borg().run_before = Some(gate);
        self
    }

    pub fn borg_run_after(mut self, gate: Gate) -> Self {
        self.borg().run_after = Some(gate);
        self
    }

    /// Enable the rclone section with a destination
    pub fn with_destination(mut self, destination: &str) -> Self {
        self.rclone().destination = Some(destination.to_string());
        self
    }

    pub fn with_lock(mut self, with_lock: bool) -> Self {
        self.rclone().with_lock = Some(with_lock);
        self
    }

    pub fn ignoring_rclone(mut self, commands: &[&str]) -> Self {
        self.rclone().ignore_commands = Some(commands.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn rclone_run_before(mut self, gate: Gate) -> Self {
        self.rclone().run_before = Some(gate);
        self
    }

    /// Add a custom shell command section
    pub fn with_command(mut self, label: &str, command_line: &str) -> Self {
        self.archive.commands.insert(
            label.to_string(),
            CustomCommand {
                command_line: command_line.to_string(),
                env_vars: BTreeMap::new(),
            },
        );
        self
    }

    pub fn build(self) -> RawArchive {
        self.archive
    }
}

/// Shell gate
pub fn shell_gate(command_line: &str) -> Gate {
    Gate::Command(command_line.to_string())
}

/// Named predicate gate
pub fn predicate_gate(name: &str) -> Gate {
    Gate::Predicate {
        predicate: name.to_string(),
    }
}
