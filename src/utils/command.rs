//! Utilities for running shell command lines

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::process::Command;
use tracing::debug;

/// Exit status and combined stdout/stderr of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub output: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run a command line through the system shell
///
/// The child inherits this process's environment overlaid with `env`.
/// Its stderr is joined to stdout through a single pipe so the output of
/// the wrapped tools keeps its original interleaving. Blocks until the
/// child exits; there is no timeout.
pub fn run_shell_command(
    command_line: &str,
    env: &BTreeMap<String, String>,
) -> io::Result<ExecutionResult> {
    #[cfg(unix)]
    let (shell, flag) = ("sh", "-c");

    #[cfg(windows)]
    let (shell, flag) = ("cmd", "/C");

    debug!("Running shell command: {}", command_line);

    let (mut reader, writer) = io::pipe()?;

    let mut cmd = Command::new(shell);
    cmd.arg(flag)
        .arg(command_line)
        .envs(env)
        .stdout(writer.try_clone()?)
        .stderr(writer);

    let mut child = cmd.spawn()?;
    // The command still owns both write ends; drop it or the read never ends
    drop(cmd);

    let mut output = Vec::new();
    reader.read_to_end(&mut output)?;
    let status = child.wait()?;

    Ok(ExecutionResult {
        code: status.code(),
        output: String::from_utf8_lossy(&output).into_owned(),
    })
}
