//! Command execution abstraction for testability
//!
//! This module provides a trait-based abstraction for command execution,
//! enabling dependency injection and mocking for tests.

use std::collections::BTreeMap;
use std::io;

pub use super::command::ExecutionResult;

/// Abstraction for command execution, enabling mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run a shell command line with `env` overlaid on the inherited environment
    fn run_shell(
        &self,
        command_line: &str,
        env: &BTreeMap<String, String>,
    ) -> io::Result<ExecutionResult>;
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealExecutor {
    fn run_shell(
        &self,
        command_line: &str,
        env: &BTreeMap<String, String>,
    ) -> io::Result<ExecutionResult> {
        super::command::run_shell_command(command_line, env)
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Recorded command invocation
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct CommandCall {
        pub command_line: String,
        pub env: BTreeMap<String, String>,
    }

    impl CommandCall {
        /// Value of an overlaid environment variable
        pub fn env_var(&self, key: &str) -> Option<&str> {
            self.env.get(key).map(String::as_str)
        }
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        Exit { code: i32, output: String },
        SpawnError(String),
    }

    impl MockResponse {
        pub fn success() -> Self {
            MockResponse::Exit {
                code: 0,
                output: String::new(),
            }
        }

        pub fn exit(code: i32, output: &str) -> Self {
            MockResponse::Exit {
                code,
                output: output.to_string(),
            }
        }
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::success()
        }
    }

    type Matcher = Arc<dyn Fn(&CommandCall) -> bool + Send + Sync>;

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Recorded command invocations
        pub calls: Arc<Mutex<Vec<CommandCall>>>,
        /// Pre-configured responses, first match wins
        responses: Arc<Mutex<Vec<(Matcher, MockResponse)>>>,
        /// Default response when no rule matches
        default_response: Arc<Mutex<MockResponse>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond with `response` to command lines containing `needle`
        pub fn expect(self, needle: &str, response: MockResponse) -> Self {
            let needle = needle.to_string();
            self.expect_when(move |call| call.command_line.contains(&needle), response)
        }

        /// Respond with `response` to calls accepted by `matcher`
        pub fn expect_when<F>(self, matcher: F, response: MockResponse) -> Self
        where
            F: Fn(&CommandCall) -> bool + Send + Sync + 'static,
        {
            self.responses
                .lock()
                .unwrap()
                .push((Arc::new(matcher), response));
            self
        }

        /// Set the default response for unmatched calls
        pub fn with_default_response(self, response: MockResponse) -> Self {
            *self.default_response.lock().unwrap() = response;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<CommandCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Get all recorded command lines
        pub fn command_lines(&self) -> Vec<String> {
            self.get_calls().into_iter().map(|c| c.command_line).collect()
        }

        /// Check if any command line contained `needle`
        pub fn was_called(&self, needle: &str) -> bool {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .any(|c| c.command_line.contains(needle))
        }

        /// Number of command lines containing `needle`
        pub fn call_count(&self, needle: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.command_line.contains(needle))
                .count()
        }

        fn get_response(&self, call: &CommandCall) -> MockResponse {
            self.responses
                .lock()
                .unwrap()
                .iter()
                .find(|(matcher, _)| matcher(call))
                .map(|(_, response)| response.clone())
                .unwrap_or_else(|| self.default_response.lock().unwrap().clone())
        }
    }

    impl CommandExecutor for MockExecutor {
        fn run_shell(
            &self,
            command_line: &str,
            env: &BTreeMap<String, String>,
        ) -> io::Result<ExecutionResult> {
            let call = CommandCall {
                command_line: command_line.to_string(),
                env: env.clone(),
            };
            let response = self.get_response(&call);
            self.calls.lock().unwrap().push(call);

            match response {
                MockResponse::Exit { code, output } => Ok(ExecutionResult {
                    code: Some(code),
                    output,
                }),
                MockResponse::SpawnError(message) => Err(io::Error::other(message)),
            }
        }
    }
}
