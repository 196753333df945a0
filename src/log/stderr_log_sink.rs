use crate::log::{log_level::LogLevel, log_sink::LogSink};

/// Writes records at or above `min_level` straight to stderr.
///
/// Used by the command-line tools when no log file is configured.
#[derive(Debug, Clone)]
pub struct StderrLogSink {
    min_level: LogLevel,
}

impl StderrLogSink {
    #[must_use]
    pub const fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Default for StderrLogSink {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl LogSink for StderrLogSink {
    fn log(&self, level: LogLevel, msg: &str, _target: &'static str) {
        if level >= self.min_level {
            eprintln!("[{level}] {msg}");
        }
    }
}
