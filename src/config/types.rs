use crate::managers::logging::parse_level;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::Level;

/// Root configuration structure of one configuration unit
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Actions run when none are given on the command line
    #[serde(default)]
    pub default_actions: Vec<String>,

    /// Override for the borg binary location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borg_bin: Option<PathBuf>,

    /// Override for the rclone binary location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rclone_bin: Option<PathBuf>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_log_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,

    /// Values inherited by every archive
    #[serde(default)]
    pub defaults: ArchiveDefaults,

    #[serde(default)]
    pub archives: Vec<RawArchive>,
}

impl Config {
    /// Base level, `info` unless configured
    pub fn base_level(&self) -> Level {
        resolve_level(self.log_level.as_deref(), Level::INFO)
    }

    pub fn console_level(&self) -> Level {
        resolve_level(self.console_log_level.as_deref(), self.base_level())
    }

    pub fn email_level(&self) -> Level {
        resolve_level(self.email_log_level.as_deref(), self.base_level())
    }
}

fn resolve_level(name: Option<&str>, fallback: Level) -> Level {
    name.and_then(parse_level).unwrap_or(fallback)
}

/// Shared per-tool defaults, applied under every archive's own values
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ArchiveDefaults {
    #[serde(default)]
    pub borg: RawBorgSection,
    #[serde(default)]
    pub rclone: RawRcloneSection,
}

/// One archive as declared by the user (before defaults merging)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawArchive {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borg: Option<RawBorgSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rclone: Option<RawRcloneSection>,

    /// Any other table is a custom shell command, addressed as `shell:<name>`
    #[serde(flatten)]
    pub commands: BTreeMap<String, CustomCommand>,
}

/// Borg section as declared; `None` means "not given"
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawBorgSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands_extra: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_commands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<BTreeMap<String, String>>,
    #[serde(default, alias = "do-if", skip_serializing_if = "Option::is_none")]
    pub run_before: Option<Gate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_after: Option<Gate>,
}

/// Rclone section as declared; `None` means "not given"
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawRcloneSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_lock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands_extra: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_commands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<BTreeMap<String, String>>,
    #[serde(default, alias = "do-if", skip_serializing_if = "Option::is_none")]
    pub run_before: Option<Gate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_after: Option<Gate>,
}

impl RawRcloneSection {
    /// True when no rclone option was declared at all
    pub fn is_empty(&self) -> bool {
        self.with_lock.is_none()
            && self.destination.is_none()
            && self.commands_extra.is_none()
            && self.ignore_commands.is_none()
            && self.env_vars.is_none()
            && self.run_before.is_none()
            && self.run_after.is_none()
    }
}

/// Named shell command attached to an archive
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CustomCommand {
    pub command_line: String,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
}

/// Condition evaluated around an action for one archive
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Gate {
    /// Shell command; exit code 0 means "go"
    Command(String),
    /// Name from the predicate registry
    Predicate { predicate: String },
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gate::Command(cmd) => write!(f, "command `{}`", cmd),
            Gate::Predicate { predicate } => write!(f, "predicate '{}'", predicate),
        }
    }
}

/// Email notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EmailConfig {
    #[serde(default = "default_use", rename = "use")]
    pub enabled: bool,
    #[serde(default)]
    pub from: String,
    pub to: Recipients,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpConfig>,
}

/// `to` may be one address or a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    /// Individual addresses; a single string may itself be comma separated
    pub fn addresses(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Recipients::One(s) => s.split(',').collect(),
            Recipients::Many(list) => list.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Value for the `To` header
    pub fn header_value(&self) -> String {
        self.addresses().join(", ")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    #[serde(default, alias = "useSTARTTLS")]
    pub use_starttls: bool,
    #[serde(default)]
    pub password: String,
}

fn default_use() -> bool {
    true
}

/// Archive after defaults merging; every option has a concrete value
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveConfig {
    pub borg: BorgSection,
    pub rclone: RcloneSection,
    pub commands: BTreeMap<String, CustomCommand>,
}

impl ArchiveConfig {
    pub fn repository(&self) -> &str {
        &self.borg.repository
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BorgSection {
    pub repository: String,
    pub source: Vec<String>,
    pub exclude: Vec<String>,
    pub archive_name: String,
    pub compression: String,
    pub encryption_mode: String,
    pub commands_extra: ExtraArgs,
    pub ignore_commands: Vec<String>,
    pub env_vars: BTreeMap<String, String>,
    pub run_before: Option<Gate>,
    pub run_after: Option<Gate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RcloneSection {
    /// Whether the archive declared any rclone options
    pub in_use: bool,
    pub with_lock: bool,
    /// Always the borg repository
    pub source: String,
    pub destination: Option<String>,
    pub commands_extra: ExtraArgs,
    pub ignore_commands: Vec<String>,
    pub env_vars: BTreeMap<String, String>,
    pub run_before: Option<Gate>,
    pub run_after: Option<Gate>,
}

/// Per-command extra arguments
///
/// Values are stored with a leading space so they can be appended to a
/// base command line as-is. Unknown commands yield an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraArgs(BTreeMap<String, String>);

impl ExtraArgs {
    pub fn new(raw: BTreeMap<String, String>) -> Self {
        Self(
            raw.into_iter()
                .map(|(cmd, args)| (cmd, format!(" {}", args)))
                .collect(),
        )
    }

    /// Arguments for `command`, or `""` if none were configured
    pub fn get(&self, command: &str) -> &str {
        self.0.get(command).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Default value functions

pub(crate) fn default_archive_name() -> String {
    "\"{now:%Y-%m-%d.%H:%M}\"".to_string()
}
pub(crate) fn default_compression() -> String {
    "lz4".to_string()
}
pub(crate) fn default_encryption_mode() -> String {
    "repokey".to_string()
}
