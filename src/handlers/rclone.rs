//! Rclone handler
//!
//! Rclone commands take the borg repository as their source and the
//! configured destination as their target. Which commands need which is
//! fixed per verb. With `with-lock`, the rclone call is wrapped in
//! `borg with-lock` so it never overlaps a borg operation on the repository.

use super::{with_params, Action, ActionHandler, Invocation, Prefix, Step, ToolPaths};
use crate::config::{ArchiveConfig, BORG_REPO_VAR};
use tracing::debug;

/// Commands that take the repository as source argument
pub const REQUIRE_SOURCE: &[&str] = &["sync", "copy", "move", "check", "copyto"];

/// Commands that take the destination as argument
pub const REQUIRE_DESTINATION: &[&str] = &[
    "sync", "copy", "move", "delete", "purge", "mkdir", "rmdir", "rmdirs", "check", "ls", "lsd",
    "lsl", "size", "cleanup", "dedupe", "copyto",
];

pub struct RcloneDefault;

impl ActionHandler for RcloneDefault {
    fn plan(&self, tools: &ToolPaths, archive: &ArchiveConfig, action: &Action) -> Step {
        let cmd = action.command.as_str();
        debug!("Default command handler is used for rclone command '{}'", cmd);

        let rclone = &archive.rclone;
        let borg = &archive.borg;

        if !rclone.in_use {
            return Step::notice(format!(
                "No section 'rclone' for repository '{}', command '{}' won't be run",
                borg.repository, cmd
            ));
        }

        let mut cmd_line = cmd.to_string();

        if REQUIRE_SOURCE.contains(&cmd) {
            cmd_line.push(' ');
            cmd_line.push_str(&rclone.source);
        }
        if REQUIRE_DESTINATION.contains(&cmd) {
            let Some(ref destination) = rclone.destination else {
                return Step::refuse(format!(
                    "No 'destination' for repository '{}', command '{}' won't be run",
                    borg.repository, cmd
                ));
            };
            cmd_line.push(' ');
            cmd_line.push_str(destination);
        }
        cmd_line.push_str(rclone.commands_extra.get(cmd));

        let mut env = rclone.env_vars.clone();

        let invocation = if rclone.with_lock {
            env.extend(borg.env_vars.clone());
            Invocation::new(
                Prefix::Borg,
                with_params(
                    format!(
                        "{} with-lock {} {} {}",
                        tools.borg, borg.repository, tools.rclone, cmd_line
                    ),
                    &action.params,
                ),
                env,
            )
        } else {
            env.insert(BORG_REPO_VAR.to_string(), borg.repository.clone());
            Invocation::new(
                Prefix::Rclone,
                with_params(format!("{} {}", tools.rclone, cmd_line), &action.params),
                env,
            )
        };

        Step::Run(invocation)
    }

    fn name(&self) -> &'static str {
        "rclone-default"
    }
}
