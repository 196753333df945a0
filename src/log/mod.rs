//! Leveled, non-blocking logging shared by every pipeline thread.
pub mod log_level;
pub mod log_macros;
pub mod log_msg;
pub mod log_sink;
pub mod logger;
pub mod logger_handle;
pub mod noop_log_sink;
pub mod stderr_log_sink;

pub use log_level::LogLevel;
pub use log_sink::LogSink;
pub use logger::Logger;
pub use logger_handle::LoggerHandle;
pub use noop_log_sink::NoopLogSink;
pub use stderr_log_sink::StderrLogSink;

use std::time::SystemTime;

/// Wall-clock milliseconds since the UNIX epoch (0 if the clock is before it).
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
