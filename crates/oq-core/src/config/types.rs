//! Configuration types

use serde::{Deserialize, Serialize};

/// Default name for the facade worker thread
pub const DEFAULT_WORKER_NAME: &str = "object-queue-worker";

/// Dead-prefix size (bytes) at which a file queue considers compacting
pub const DEFAULT_COMPACT_THRESHOLD: u64 = 1024 * 1024;

/// Lock retries before giving up on opening a file queue
pub const DEFAULT_LOCK_RETRIES: u32 = 5;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Worker thread configuration
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Durable queue configuration
    #[serde(default)]
    pub file: FileQueueConfig,
}

/// Worker thread configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Thread name, visible in debuggers and panic messages
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
        }
    }
}

fn default_thread_name() -> String {
    DEFAULT_WORKER_NAME.to_string()
}

/// Durable queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileQueueConfig {
    /// Call `sync_data` after every mutation (default: true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
    /// Dead-prefix size in bytes that triggers compaction (default: 1 MiB)
    #[serde(default = "default_compact_threshold")]
    pub compact_threshold: u64,
    /// Lock acquisition retries on open (default: 5)
    #[serde(default = "default_lock_retries")]
    pub lock_retries: u32,
}

impl Default for FileQueueConfig {
    fn default() -> Self {
        Self {
            sync_writes: default_sync_writes(),
            compact_threshold: default_compact_threshold(),
            lock_retries: default_lock_retries(),
        }
    }
}

fn default_sync_writes() -> bool {
    true
}

fn default_compact_threshold() -> u64 {
    DEFAULT_COMPACT_THRESHOLD
}

fn default_lock_retries() -> u32 {
    DEFAULT_LOCK_RETRIES
}
