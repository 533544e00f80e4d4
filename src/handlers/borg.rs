//! Borg handlers
//!
//! Handles:
//! - `init`, skipped when the repository is already initialized
//! - `create`, built from sources, excludes and compression settings
//! - any other borg command through the default handler

use super::{with_params, Action, ActionHandler, Invocation, Prefix, Step, ToolPaths};
use crate::config::ArchiveConfig;
use crate::utils::{borg, ExecutionResult};
use tracing::debug;

/// Exit code borg uses for errors (as opposed to warnings)
const BORG_ERROR_EXIT: i32 = 2;

fn borg_invocation(tools: &ToolPaths, archive: &ArchiveConfig, args: String) -> Invocation {
    Invocation::new(
        Prefix::Borg,
        format!("{} {}", tools.borg, args),
        archive.borg.env_vars.clone(),
    )
}

/// `borg init` failing only because the repository exists is fine
fn repository_already_exists(result: &ExecutionResult) -> bool {
    result.code == Some(BORG_ERROR_EXIT) && borg::reports_existing_repository(&result.output)
}

pub struct BorgInit;

impl ActionHandler for BorgInit {
    fn plan(&self, tools: &ToolPaths, archive: &ArchiveConfig, action: &Action) -> Step {
        let conf = &archive.borg;

        if borg::is_initialized(&conf.repository) {
            return Step::notice(format!(
                "Repository '{}' is already initialized",
                conf.repository
            ));
        }

        let args = format!(
            "init --encryption={} {}{}",
            conf.encryption_mode,
            conf.repository,
            conf.commands_extra.get("init")
        );

        let mut invocation = borg_invocation(tools, archive, with_params(args, &action.params));
        invocation.tolerate = Some(repository_already_exists);
        Step::Run(invocation)
    }

    fn name(&self) -> &'static str {
        "borg-init"
    }
}

pub struct BorgCreate;

impl ActionHandler for BorgCreate {
    fn plan(&self, tools: &ToolPaths, archive: &ArchiveConfig, action: &Action) -> Step {
        let conf = &archive.borg;

        let mut args = format!(
            "create --compression {} ::{}",
            conf.compression, conf.archive_name
        );
        for src in &conf.source {
            args.push(' ');
            args.push_str(src);
        }
        for exclude in &conf.exclude {
            args.push_str(&format!(" --exclude '{}'", exclude));
        }
        args.push_str(conf.commands_extra.get("create"));

        Step::Run(borg_invocation(tools, archive, with_params(args, &action.params)))
    }

    fn name(&self) -> &'static str {
        "borg-create"
    }
}

/// Any borg command: the command name, its extra args, then the params
pub struct BorgDefault;

impl ActionHandler for BorgDefault {
    fn plan(&self, tools: &ToolPaths, archive: &ArchiveConfig, action: &Action) -> Step {
        debug!(
            "Default command handler is used for borg command '{}'",
            action.command
        );

        let args = format!(
            "{}{}",
            action.command,
            archive.borg.commands_extra.get(&action.command)
        );
        Step::Run(borg_invocation(tools, archive, with_params(args, &action.params)))
    }

    fn name(&self) -> &'static str {
        "borg-default"
    }
}
