//! Test utilities for borg-manager
//!
//! This crate provides shared test utilities, mock re-exports,
//! and helper functions for testing the borg-manager orchestration.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ArchiveBuilder, ConfigBuilder, TestContext};
//!
//! #[test]
//! fn my_test() {
//!     let ctx = TestContext::from_builder(
//!         ConfigBuilder::new()
//!             .with_default_actions(&["borg:create"])
//!             .add_archive(ArchiveBuilder::new("user@host:repo")),
//!     );
//!     assert!(ctx.run());
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::{predicate_gate, shell_gate, ArchiveBuilder, ConfigBuilder};
pub use fixtures::*;
pub use test_context::{RecordingPredicate, TestContext};

// Re-export types from the main crate for convenience
pub use borg_manager::config::{
    ArchiveConfig, ArchiveDefaults, Config, ConfigError, Gate, RawArchive, RawBorgSection,
    RawRcloneSection, BORG_REPO_VAR,
};
pub use borg_manager::handlers::{
    Action, ActionHandler, HandlerRegistry, Invocation, Prefix, Step, ToolPaths,
};
pub use borg_manager::managers::backup::{BackupError, BackupManager};
pub use borg_manager::managers::gate::PredicateRegistry;

// Re-export mock implementations from the main crate
pub use borg_manager::utils::executor::mock::{CommandCall, MockExecutor, MockResponse};
pub use borg_manager::utils::executor::CommandExecutor;
