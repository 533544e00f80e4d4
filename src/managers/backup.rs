//! Backup manager - orchestrates action execution across archives
//!
//! One run: normalize every archive, parse every action, create local
//! repository directories, then for each action (in order) and each archive
//! (in order) gate, plan and execute. The first tool failure or configuration
//! error aborts the whole run.

use crate::config::{
    normalize_archives, ArchiveConfig, Config, ConfigError, Gate, BORG_REPO_VAR,
};
use crate::handlers::{
    Action, ActionHandler, HandlerRegistry, Invocation, Prefix, Severity, Step, ToolPaths,
};
use crate::managers::gate::{GateEvaluator, PredicateRegistry};
use crate::utils::{borg, CommandExecutor, ExecutionResult, RealExecutor};
use std::collections::BTreeMap;
use std::io;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{tool} process terminated with error code {}", describe_code(.code))]
    ToolFailed {
        tool: &'static str,
        code: Option<i32>,
    },

    #[error("Failed to start {tool} process: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to prepare repository directory '{repository}': {source}")]
    Repository {
        repository: String,
        #[source]
        source: io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

/// Per-archive outcome of one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Ignore-listed or pre-condition failed
    Gated,
    /// Handler decided there is nothing to run
    Skipped,
    Completed,
}

pub struct BackupManager {
    config: Config,
    cmd_line_actions: Vec<String>,
    tools: ToolPaths,
    executor: Box<dyn CommandExecutor>,
    handlers: HandlerRegistry,
    predicates: PredicateRegistry,
}

impl BackupManager {
    /// Create new backup manager running real processes
    ///
    /// `cmd_line_actions` replaces the configured `default-actions` when
    /// non-empty.
    pub fn new(config: Config, cmd_line_actions: Vec<String>) -> Self {
        Self::with_executor(config, cmd_line_actions, Box::new(RealExecutor::new()))
    }

    /// Create backup manager with a specific executor
    pub fn with_executor(
        config: Config,
        cmd_line_actions: Vec<String>,
        executor: Box<dyn CommandExecutor>,
    ) -> Self {
        let tools = ToolPaths::new(
            borg::resolve_binary("borg", config.borg_bin.as_deref()),
            borg::resolve_binary("rclone", config.rclone_bin.as_deref()),
        );

        Self {
            config,
            cmd_line_actions,
            tools,
            executor,
            handlers: HandlerRegistry::new(),
            predicates: PredicateRegistry::new(),
        }
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_predicates(mut self, predicates: PredicateRegistry) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Whether the actions came from the command line
    pub fn is_interactive(&self) -> bool {
        !self.cmd_line_actions.is_empty()
    }

    /// Actions this run executes, in order
    pub fn actions(&self) -> &[String] {
        if self.is_interactive() {
            &self.cmd_line_actions
        } else {
            &self.config.default_actions
        }
    }

    /// Parse every action before anything runs
    pub fn parse_actions(&self) -> Result<Vec<Action>, ConfigError> {
        self.actions().iter().map(|s| Action::parse(s)).collect()
    }

    /// Normalize archives and check every referenced predicate
    pub fn normalize(&self) -> Result<Vec<ArchiveConfig>, ConfigError> {
        let archives = normalize_archives(&self.config)?;
        for archive in &archives {
            self.predicates.validate(archive)?;
        }
        Ok(archives)
    }

    /// Create the directories of local repositories
    fn prepare_repositories(&self, archives: &[ArchiveConfig]) -> Result<(), BackupError> {
        for archive in archives {
            let repository = archive.repository();
            borg::ensure_local_repository(repository).map_err(|source| {
                BackupError::Repository {
                    repository: repository.to_string(),
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// Run every action, stopping at the first error
    pub fn try_run(&self) -> Result<(), BackupError> {
        let archives = self.normalize()?;
        let actions = self.parse_actions()?;
        self.prepare_repositories(&archives)?;

        debug!("Using borg binary: {}", self.tools.borg);
        debug!("Using rclone binary: {}", self.tools.rclone);

        for action in &actions {
            self.run_action(&archives, action)?;
        }

        Ok(())
    }

    /// Run the whole unit, logging any error
    ///
    /// Returns `true` when every action completed.
    pub fn run(&self) -> bool {
        let start_time = Instant::now();
        info!("Actions to run: {}", self.actions().join(", "));

        match self.try_run() {
            Ok(()) => {
                info!(
                    "All actions completed in {}",
                    format_duration(start_time.elapsed().as_secs())
                );
                true
            }
            Err(e) => {
                error!("{}", e);
                error!(
                    "Run aborted after {}",
                    format_duration(start_time.elapsed().as_secs())
                );
                false
            }
        }
    }

    /// Run one action over every archive in order
    pub fn run_action(&self, archives: &[ArchiveConfig], action: &Action) -> Result<(), BackupError> {
        let handler = self.handlers.resolve(action);
        info!("Running action '{}' ({})", action, handler.name());

        for archive in archives {
            let outcome = self.run_for_archive(handler, archive, action)?;
            debug!(
                "Action '{}' on '{}': {:?}",
                action,
                archive.repository(),
                outcome
            );
        }

        Ok(())
    }

    fn run_for_archive(
        &self,
        handler: &dyn ActionHandler,
        archive: &ArchiveConfig,
        action: &Action,
    ) -> Result<Outcome, BackupError> {
        let gates = self.gates_for(archive, action.prefix);

        if let Some(ref gates) = gates {
            if gates.ignored.iter().any(|c| c == &action.command) {
                info!(
                    "Command '{}' is in ignore list for repository '{}', skipped",
                    action.command,
                    archive.repository()
                );
                return Ok(Outcome::Gated);
            }

            if let Some(gate) = gates.run_before {
                let description = format!("run-before for '{}' on '{}'", action, archive.repository());
                if !self.evaluator().evaluate(gate, archive, &gates.env, &description)? {
                    info!(
                        "Condition {} not met for repository '{}', '{}' skipped",
                        gate,
                        archive.repository(),
                        action
                    );
                    return Ok(Outcome::Gated);
                }
            }
        }

        let outcome = match handler.plan(&self.tools, archive, action) {
            Step::Skip { reason, severity } => {
                match severity {
                    Severity::Notice => info!("{}", reason),
                    Severity::Error => error!("{}", reason),
                }
                Outcome::Skipped
            }
            Step::Run(invocation) => {
                self.execute(&invocation)?;
                Outcome::Completed
            }
        };

        if let Some(gates) = gates {
            if let Some(gate) = gates.run_after {
                let description = format!("run-after for '{}' on '{}'", action, archive.repository());
                // Post-conditions never change the outcome
                if let Err(e) = self.evaluator().evaluate(gate, archive, &gates.env, &description) {
                    warn!("Ignoring failed {}: {}", description, e);
                }
            }
        }

        Ok(outcome)
    }

    /// Run an invocation and classify its result
    fn execute(&self, invocation: &Invocation) -> Result<ExecutionResult, BackupError> {
        let tool = invocation.tool.log_label();
        info!("{} command line: `{}`", tool, invocation.command_line);

        let result = self
            .executor
            .run_shell(&invocation.command_line, &invocation.env)
            .map_err(|source| BackupError::Spawn { tool, source })?;

        let accepted = invocation.accepts(&result);
        let output = result.output.trim_end();
        if !output.is_empty() {
            if accepted {
                info!("{} OUTPUT:\n{}", tool, output);
            } else {
                error!("{} OUTPUT:\n{}", tool, output);
            }
        }

        if !accepted {
            return Err(BackupError::ToolFailed {
                tool,
                code: result.code,
            });
        }
        if !result.success() {
            info!(
                "{} exit code {} accepted: {}",
                tool,
                describe_code(&result.code),
                invocation.command_line
            );
        }

        Ok(result)
    }

    fn evaluator(&self) -> GateEvaluator<'_> {
        GateEvaluator::new(self.executor.as_ref(), &self.predicates)
    }

    /// Gates of the tool section an action belongs to
    fn gates_for<'a>(&self, archive: &'a ArchiveConfig, prefix: Prefix) -> Option<SectionGates<'a>> {
        match prefix {
            Prefix::Borg => Some(SectionGates {
                ignored: &archive.borg.ignore_commands,
                run_before: archive.borg.run_before.as_ref(),
                run_after: archive.borg.run_after.as_ref(),
                env: archive.borg.env_vars.clone(),
            }),
            Prefix::Rclone => {
                let mut env = archive.rclone.env_vars.clone();
                env.insert(BORG_REPO_VAR.to_string(), archive.repository().to_string());
                Some(SectionGates {
                    ignored: &archive.rclone.ignore_commands,
                    run_before: archive.rclone.run_before.as_ref(),
                    run_after: archive.rclone.run_after.as_ref(),
                    env,
                })
            }
            Prefix::Shell => None,
        }
    }
}

struct SectionGates<'a> {
    ignored: &'a [String],
    run_before: Option<&'a Gate>,
    run_after: Option<&'a Gate>,
    env: BTreeMap<String, String>,
}

/// Format duration in human-readable form
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        let minutes = seconds / 60;
        let secs = seconds % 60;
        if secs == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, secs)
        }
    } else {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    }
}
