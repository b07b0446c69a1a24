// src/exec/options.rs

use std::time::Duration;

/// Default bound for the schema handshake.
pub const DEFAULT_SCHEMA_TIMEOUT: Duration = Duration::from_secs(15);

/// Default interval at which the supervisor looks at the paused flag.
pub const DEFAULT_PAUSE_POLL: Duration = Duration::from_millis(100);

/// Token that makes a module print its parameter schema.
pub const DEFAULT_SCHEMA_FLAG: &str = "--xml";

/// Knobs for running modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Worker pool size, i.e. the number of module processes that may run
    /// at the same time.
    pub max_concurrent: usize,
    pub pause_poll_interval: Duration,
    pub schema_timeout: Duration,
    pub schema_flag: String,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            pause_poll_interval: DEFAULT_PAUSE_POLL,
            schema_timeout: DEFAULT_SCHEMA_TIMEOUT,
            schema_flag: DEFAULT_SCHEMA_FLAG.to_string(),
        }
    }
}

/// One worker per available CPU.
pub fn default_max_concurrent() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
