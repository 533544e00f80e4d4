//! Symbolic action strings: `prefix:command[:params]`

use crate::config::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Which tool an action addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    Borg,
    Rclone,
    Shell,
}

impl Prefix {
    pub const ALL: [Prefix; 3] = [Prefix::Borg, Prefix::Rclone, Prefix::Shell];

    pub fn as_str(&self) -> &'static str {
        match self {
            Prefix::Borg => "borg",
            Prefix::Rclone => "rclone",
            Prefix::Shell => "shell",
        }
    }

    /// Upper-case tag used in tool output logs
    pub fn log_label(&self) -> &'static str {
        match self {
            Prefix::Borg => "BORG",
            Prefix::Rclone => "RCLONE",
            Prefix::Shell => "SHELL",
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prefix {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prefix::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownPrefix(s.to_string()))
    }
}

/// One unit of work, fanned out over every archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub prefix: Prefix,
    pub command: String,
    /// Passed through to the built command line verbatim
    pub params: String,
}

impl Action {
    /// Parse `prefix:command` or `prefix:command:params`
    ///
    /// Only the first two colons separate fields; `params` may contain more.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let mut parts = s.splitn(3, ':');
        let (Some(prefix), Some(command)) = (parts.next(), parts.next()) else {
            return Err(ConfigError::InvalidAction(s.to_string()));
        };
        if command.is_empty() {
            return Err(ConfigError::InvalidAction(s.to_string()));
        }

        Ok(Self {
            prefix: prefix.parse()?,
            command: command.to_string(),
            params: parts.next().unwrap_or("").to_string(),
        })
    }
}

impl FromStr for Action {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::parse(s)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}:{}", self.prefix, self.command)
        } else {
            write!(f, "{}:{}:{}", self.prefix, self.command, self.params)
        }
    }
}
