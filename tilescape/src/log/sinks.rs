//! Logger implementations.

use std::fmt::Arguments;

use parking_lot::Mutex;

use super::logger::{LogLevel, Logger};

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

/// Forwards to the `tracing` macros, tagged with the `tilescape` target.
///
/// Output appears only once a subscriber is installed, e.g. by
/// [`init_logging`](crate::logging::init_logging).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "tilescape", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "tilescape", "{}", args),
            LogLevel::Info => tracing::info!(target: "tilescape", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "tilescape", "{}", args),
            LogLevel::Error => tracing::error!(target: "tilescape", "{}", args),
        }
    }
}

/// Keeps messages at or above a minimum level in memory.
///
/// Handy for asserting on diagnostics in tests and for showing recent
/// messages in a status view.
#[derive(Debug)]
pub struct MemoryLogger {
    min_level: LogLevel,
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new(LogLevel::Trace)
    }
}

impl MemoryLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Captured messages, oldest first.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    /// Whether any captured message at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines
            .lock()
            .iter()
            .any(|(l, line)| *l == level && line.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        if level >= self.min_level {
            self.lines.lock().push((level, args.to_string()));
        }
    }
}
