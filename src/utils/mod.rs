pub mod borg;
pub mod command;

// Trait-based abstraction for testability
pub mod executor;

// Re-export commonly used types and traits (used by test crate)
pub use command::ExecutionResult;
pub use executor::{CommandExecutor, RealExecutor};
