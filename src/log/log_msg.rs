use crate::log::log_level::LogLevel;

/// A single log record travelling from a producer thread to the writer.
#[derive(Debug, Clone)]
pub struct LogMsg {
    pub level: LogLevel,
    /// Milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    pub text: String,
    /// Module path of the call site.
    pub target: &'static str,
}

impl LogMsg {
    pub fn new(level: LogLevel, text: impl Into<String>, target: &'static str, ts_ms: u128) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }

    /// Renders the record the way it is written to the log file.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "[{}] {} {} | {}",
            self.level, self.ts_ms, self.target, self.text
        )
    }
}
