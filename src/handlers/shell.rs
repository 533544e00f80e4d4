//! Named custom shell commands (`shell:<name>`)

use super::{with_params, Action, ActionHandler, Invocation, Prefix, Step, ToolPaths};
use crate::config::ArchiveConfig;
use tracing::debug;

/// Runs the archive's custom command section named by the action
pub struct NamedCommand;

impl ActionHandler for NamedCommand {
    fn plan(&self, _tools: &ToolPaths, archive: &ArchiveConfig, action: &Action) -> Step {
        let label = action.command.as_str();

        let Some(cmd) = archive.commands.get(label) else {
            return Step::notice(format!(
                "Label '{}' for custom shell command not found for repo '{}', ignored",
                label,
                archive.repository()
            ));
        };

        debug!(
            "Command handler for custom shell command labeled as '{}': '{}'",
            label, cmd.command_line
        );

        Step::Run(Invocation::new(
            Prefix::Shell,
            with_params(cmd.command_line.clone(), &action.params),
            cmd.env_vars.clone(),
        ))
    }

    fn name(&self) -> &'static str {
        "shell-command"
    }
}
