//! Per-archive gates around actions
//!
//! A gate is either a shell command (exit code 0 lets the action run) or a
//! named predicate from a closed registry. Gates are evaluated separately
//! for every archive, so one archive's negative gate never affects another.

use crate::config::{ArchiveConfig, ConfigError, Gate};
use crate::managers::backup::BackupError;
use crate::utils::{borg, CommandExecutor};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// A named condition on one archive
pub type Predicate = Arc<dyn Fn(&ArchiveConfig) -> bool + Send + Sync>;

/// Predicates a configuration may reference by name
#[derive(Clone)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    /// Registry with the built-in predicates
    pub fn new() -> Self {
        let mut registry = Self {
            predicates: HashMap::new(),
        };
        registry.register("always", |_| true);
        registry.register("never", |_| false);
        registry.register("repository-is-local", |archive| {
            borg::local_path(archive.repository()).is_some()
        });
        registry.register("repository-initialized", |archive| {
            borg::is_initialized(archive.repository())
        });
        registry.register("destination-configured", |archive| {
            archive.rclone.destination.is_some()
        });
        registry
    }

    /// Add or replace a predicate
    pub fn register<F>(&mut self, name: &str, predicate: F)
    where
        F: Fn(&ArchiveConfig) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.to_string(), Arc::new(predicate));
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Check that every predicate an archive references exists
    pub fn validate(&self, archive: &ArchiveConfig) -> Result<(), ConfigError> {
        let gates = [
            &archive.borg.run_before,
            &archive.borg.run_after,
            &archive.rclone.run_before,
            &archive.rclone.run_after,
        ];

        for gate in gates.into_iter().flatten() {
            if let Gate::Predicate { predicate } = gate {
                if !self.contains(predicate) {
                    return Err(ConfigError::UnknownPredicate {
                        name: predicate.clone(),
                        repository: archive.repository().to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates gates for one archive
pub struct GateEvaluator<'a> {
    executor: &'a dyn CommandExecutor,
    predicates: &'a PredicateRegistry,
}

impl<'a> GateEvaluator<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, predicates: &'a PredicateRegistry) -> Self {
        Self {
            executor,
            predicates,
        }
    }

    /// Evaluate `gate` for `archive`
    ///
    /// Shell gates run with `env` overlaid; their output only goes to the
    /// debug log. `description` names the gate in log messages.
    pub fn evaluate(
        &self,
        gate: &Gate,
        archive: &ArchiveConfig,
        env: &BTreeMap<String, String>,
        description: &str,
    ) -> Result<bool, BackupError> {
        match gate {
            Gate::Predicate { predicate } => {
                let check = self.predicates.get(predicate).ok_or_else(|| {
                    ConfigError::UnknownPredicate {
                        name: predicate.clone(),
                        repository: archive.repository().to_string(),
                    }
                })?;
                let result = check(archive);
                debug!(
                    "{} is predicate '{}' and result is '{}'",
                    description, predicate, result
                );
                Ok(result)
            }
            Gate::Command(command_line) => {
                let result = self
                    .executor
                    .run_shell(command_line, env)
                    .map_err(|source| BackupError::Spawn {
                        tool: "SHELL",
                        source,
                    })?;
                if !result.output.is_empty() {
                    debug!("{} output:\n{}", description, result.output);
                }
                let passed = result.success();
                debug!(
                    "{} is command `{}` and result is '{}'",
                    description, command_line, passed
                );
                Ok(passed)
            }
        }
    }
}
