//! Configuration resolution
//!
//! Resolves configuration from multiple sources with priority:
//! 1. Explicit overrides (passed as parameters)
//! 2. Environment variables
//! 3. Config file (explicit path, or `OQ_CONFIG`)
//! 4. Defaults

mod discovery;
mod types;

pub use discovery::{ConfigError, ConfigOverrides, resolve_config};
pub use types::{FileQueueConfig, QueueConfig, WorkerConfig};
