//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// Per-family worker pool configuration.
///
/// Each job family (document, image) gets its own independently sized
/// pool so that a backlog of heavy document conversions cannot starve
/// image jobs, and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Document conversion pool.
    #[serde(default = "default_document_pool")]
    pub document: PoolConfig,
    /// Image conversion pool.
    #[serde(default = "default_image_pool")]
    pub image: PoolConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            document: default_document_pool(),
            image: default_image_pool(),
        }
    }
}

/// Configuration for a single bounded worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of long-lived worker tasks.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Maximum number of accepted-but-unassigned jobs.
    #[serde(default = "default_backlog")]
    pub backlog: usize,
    /// How long `run()` waits for backlog capacity before failing
    /// with a saturation error, in milliseconds.
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            backlog: default_backlog(),
            dispatch_timeout_ms: default_dispatch_timeout(),
        }
    }
}

fn default_document_pool() -> PoolConfig {
    PoolConfig {
        workers: 2,
        backlog: default_backlog(),
        dispatch_timeout_ms: default_dispatch_timeout(),
    }
}

fn default_image_pool() -> PoolConfig {
    PoolConfig {
        workers: 4,
        backlog: default_backlog(),
        dispatch_timeout_ms: default_dispatch_timeout(),
    }
}

fn default_workers() -> usize {
    2
}

fn default_backlog() -> usize {
    100
}

fn default_dispatch_timeout() -> u64 {
    5000
}
