//! Borg Manager Library
//!
//! This library provides backup orchestration functionality wrapping borg and rclone.

pub mod config;
pub mod handlers;
pub mod managers;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, normalize_archives, ArchiveConfig, Config};
pub use handlers::{Action, HandlerRegistry, Prefix};
pub use managers::backup::{BackupError, BackupManager};
pub use managers::gate::PredicateRegistry;
pub use managers::logging::{init_logging, LogGuard, LoggingConfig};
pub use managers::notification::NotificationManager;
