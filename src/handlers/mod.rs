//! Action handlers
//!
//! Every action resolves to a handler through [`HandlerRegistry`]: a handler
//! registered for the exact `(prefix, command)` pair wins, otherwise the
//! prefix's fallback handler takes the command. Handlers only *plan* what to
//! run for one archive; execution and gating belong to the backup manager.

pub mod action;
pub mod borg;
pub mod rclone;
pub mod shell;

pub use action::{Action, Prefix};

use crate::config::ArchiveConfig;
use crate::utils::ExecutionResult;
use std::collections::{BTreeMap, HashMap};

/// Resolved tool binaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub borg: String,
    pub rclone: String,
}

impl ToolPaths {
    pub fn new(borg: impl Into<String>, rclone: impl Into<String>) -> Self {
        Self {
            borg: borg.into(),
            rclone: rclone.into(),
        }
    }
}

/// A concrete command to run for one archive
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Tool whose output this is (for logs and errors)
    pub tool: Prefix,
    pub command_line: String,
    /// Overlay on the inherited environment
    pub env: BTreeMap<String, String>,
    /// Accepts specific non-zero results as success
    pub tolerate: Option<fn(&ExecutionResult) -> bool>,
}

impl Invocation {
    pub fn new(tool: Prefix, command_line: String, env: BTreeMap<String, String>) -> Self {
        Self {
            tool,
            command_line,
            env,
            tolerate: None,
        }
    }

    /// Whether `result` counts as success for this invocation
    pub fn accepts(&self, result: &ExecutionResult) -> bool {
        result.success() || self.tolerate.is_some_and(|tolerate| tolerate(result))
    }
}

/// How loudly a skipped step is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Notice,
    Error,
}

/// What a handler decided for one archive
#[derive(Debug, Clone)]
pub enum Step {
    Run(Invocation),
    /// Nothing to run; not a failure
    Skip { reason: String, severity: Severity },
}

impl Step {
    pub fn notice(reason: impl Into<String>) -> Self {
        Step::Skip {
            reason: reason.into(),
            severity: Severity::Notice,
        }
    }

    pub fn refuse(reason: impl Into<String>) -> Self {
        Step::Skip {
            reason: reason.into(),
            severity: Severity::Error,
        }
    }
}

/// Trait for action handlers
pub trait ActionHandler: Send + Sync {
    /// Decide what to run for `action` on one archive
    fn plan(&self, tools: &ToolPaths, archive: &ArchiveConfig, action: &Action) -> Step;

    /// Get handler name (for logging)
    fn name(&self) -> &'static str;
}

/// Maps actions to handlers, with one fallback per prefix
pub struct HandlerRegistry {
    specific: HashMap<(Prefix, String), Box<dyn ActionHandler>>,
    borg_fallback: Box<dyn ActionHandler>,
    rclone_fallback: Box<dyn ActionHandler>,
    shell_fallback: Box<dyn ActionHandler>,
}

impl HandlerRegistry {
    /// Registry with the built-in handlers
    pub fn new() -> Self {
        let mut registry = Self {
            specific: HashMap::new(),
            borg_fallback: Box::new(borg::BorgDefault),
            rclone_fallback: Box::new(rclone::RcloneDefault),
            shell_fallback: Box::new(shell::NamedCommand),
        };
        registry.register(Prefix::Borg, "init", Box::new(borg::BorgInit));
        registry.register(Prefix::Borg, "create", Box::new(borg::BorgCreate));
        registry
    }

    /// Handle `prefix:command` with `handler`, replacing any previous one
    pub fn register(&mut self, prefix: Prefix, command: &str, handler: Box<dyn ActionHandler>) {
        self.specific.insert((prefix, command.to_string()), handler);
    }

    /// Replace the handler used for commands of `prefix` without a specific one
    pub fn set_fallback(&mut self, prefix: Prefix, handler: Box<dyn ActionHandler>) {
        match prefix {
            Prefix::Borg => self.borg_fallback = handler,
            Prefix::Rclone => self.rclone_fallback = handler,
            Prefix::Shell => self.shell_fallback = handler,
        }
    }

    /// Handler for an action
    pub fn resolve(&self, action: &Action) -> &dyn ActionHandler {
        if let Some(handler) = self.specific.get(&(action.prefix, action.command.clone())) {
            return handler.as_ref();
        }
        match action.prefix {
            Prefix::Borg => self.borg_fallback.as_ref(),
            Prefix::Rclone => self.rclone_fallback.as_ref(),
            Prefix::Shell => self.shell_fallback.as_ref(),
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Append caller-supplied params to a command line
pub(crate) fn with_params(command_line: String, params: &str) -> String {
    if params.is_empty() {
        command_line
    } else {
        format!("{} {}", command_line, params)
    }
}
