//! Framework configuration.
//!
//! Configuration is an explicitly constructed value passed to the
//! operations that need it. There is no process-wide state.

/// Configuration for framework operations.
#[derive(Debug, Clone)]
pub struct Config {
    /// How many records the rekey worker processes between
    /// cancellation checks and progress reports.
    pub rekey_checkpoint: usize,

    /// Whether the rekey worker emits progress events at all.
    pub rekey_progress_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rekey_checkpoint: 100,
            rekey_progress_events: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rekey checkpoint interval (record count).
    ///
    /// A value of zero is treated as one: the worker always checks
    /// for cancellation at least once per record.
    #[must_use]
    pub const fn rekey_checkpoint(mut self, records: usize) -> Self {
        self.rekey_checkpoint = records;
        self
    }

    /// Sets whether the rekey worker emits progress events.
    #[must_use]
    pub const fn rekey_progress_events(mut self, value: bool) -> Self {
        self.rekey_progress_events = value;
        self
    }
}
