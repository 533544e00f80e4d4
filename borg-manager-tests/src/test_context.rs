//! Test context and harness for orchestration tests
//!
//! Wires a [`BackupManager`] to a [`MockExecutor`] so tests can inspect
//! every command line a run would have started.

use crate::config_builder::ConfigBuilder;
use borg_manager::config::{ArchiveConfig, Config};
use borg_manager::managers::backup::BackupManager;
use borg_manager::managers::gate::PredicateRegistry;
use borg_manager::utils::executor::mock::MockExecutor;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test context that manages test resources and provides common utilities
pub struct TestContext {
    /// Temporary directory for test files
    temp_dir: TempDir,
    /// The test configuration
    config: Config,
    executor: MockExecutor,
    predicates: PredicateRegistry,
}

impl TestContext {
    /// Context with an empty configuration
    pub fn new() -> Self {
        Self::from_builder(ConfigBuilder::new())
    }

    /// Create a test context from a ConfigBuilder
    pub fn from_builder(builder: ConfigBuilder) -> Self {
        let (config, temp_dir) = builder.persist();

        Self {
            temp_dir,
            config,
            executor: MockExecutor::new(),
            predicates: PredicateRegistry::new(),
        }
    }

    /// Replace the mock executor (e.g. one with configured responses)
    pub fn with_executor(mut self, executor: MockExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_predicates(mut self, predicates: PredicateRegistry) -> Self {
        self.predicates = predicates;
        self
    }

    /// Get the temporary directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&self) -> &MockExecutor {
        &self.executor
    }

    /// Manager over the context's config, sharing the mock executor
    pub fn manager(&self, cmd_line_actions: &[&str]) -> BackupManager {
        BackupManager::with_executor(
            self.config.clone(),
            cmd_line_actions.iter().map(|a| a.to_string()).collect(),
            Box::new(self.executor.clone()),
        )
        .with_predicates(self.predicates.clone())
    }

    /// Run the configured default actions
    pub fn run(&self) -> bool {
        self.manager(&[]).run()
    }

    /// Run the given actions instead of the defaults
    pub fn run_actions(&self, actions: &[&str]) -> bool {
        self.manager(actions).run()
    }

    /// Recorded command lines
    pub fn command_lines(&self) -> Vec<String> {
        self.executor.command_lines()
    }

    /// Create a file in the temp dir
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Predicate that records the repositories it was asked about
#[derive(Clone, Default)]
pub struct RecordingPredicate {
    seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under `name`, answering with `answer(repository)`
    pub fn register<F>(&self, registry: &mut PredicateRegistry, name: &str, answer: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let seen = Arc::clone(&self.seen);
        registry.register(name, move |archive: &ArchiveConfig| {
            seen.lock().push(archive.repository().to_string());
            answer(archive.repository())
        });
    }

    /// Repositories evaluated so far, in order
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}
