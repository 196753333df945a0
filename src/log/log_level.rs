use std::fmt;

/// Severity of a log record, from most to least verbose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-packet and per-NAL chatter (hex dumps of parameter sets).
    Trace,
    /// Pipeline internals: queue depths, RTSP exchanges, timer ticks.
    Debug,
    /// Session milestones: connected, subsession set up, first frame.
    Info,
    /// Recoverable trouble: failed SETUP of one subsession, truncated frames.
    Warn,
    /// The stream cannot continue.
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
