// src/exec/scale.rs

//! Mapping from protocol events to the integer progress scale.
//!
//! ```text
//! 0          not started
//! 1..=1000   filter progress (fraction * 1000) and start/end heartbeats
//! 1001       a filter ended at the top of the scale
//! 1002       the module process terminated
//! ```

pub const PROGRESS_NOT_STARTED: i32 = 0;
pub const PROGRESS_FULL: i32 = 1000;
pub const PROGRESS_FILTER_END: i32 = 1001;
pub const PROGRESS_TERMINATED: i32 = 1002;

/// Tracks the last protocol-derived value of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressScale {
    current: i32,
}

impl Default for ProgressScale {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressScale {
    pub fn new() -> Self {
        Self {
            current: PROGRESS_NOT_STARTED,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    /// Explicit progress: `round(fraction * 1000)` clamped to `1..=1000`.
    pub fn on_fraction(&mut self, fraction: f64) -> i32 {
        let scaled = (fraction * f64::from(PROGRESS_FULL)).round();
        let value = if scaled.is_nan() {
            1
        } else {
            scaled.clamp(1.0, f64::from(PROGRESS_FULL)) as i32
        };
        self.current = value;
        value
    }

    /// Heartbeat on `<filter-start>`.
    pub fn on_filter_start(&mut self) -> i32 {
        self.current = (self.current + 1).min(PROGRESS_FULL);
        self.current
    }

    /// Heartbeat on `<filter-end>`. Landing on 1000 is bumped to 1001 so an
    /// end boundary never looks like plain 100% progress.
    pub fn on_filter_end(&mut self) -> i32 {
        let value = (self.current + 1).min(PROGRESS_FULL);
        self.current = if value == PROGRESS_FULL {
            PROGRESS_FILTER_END
        } else {
            value
        };
        self.current
    }

    /// The process exited. Always 1002.
    pub fn on_terminated(&mut self) -> i32 {
        self.current = PROGRESS_TERMINATED;
        self.current
    }
}
