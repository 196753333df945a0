use std::sync::mpsc;

use crate::log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink, now_millis};

/// Cloneable producer side of the [`Logger`](super::Logger).
///
/// `try_log` never blocks: when the bounded queue is full the record is
/// dropped. A camera thread must never stall on disk I/O.
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Enqueues one record stamped with the current time.
    ///
    /// # Errors
    /// `TrySendError::Full` when the queue is at capacity,
    /// `TrySendError::Disconnected` when the writer thread is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        self.tx
            .try_send(LogMsg::new(level, text, target, now_millis()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::mpsc::{TrySendError, sync_channel};

    #[test]
    fn queued_record_keeps_level_text_and_target() {
        let (tx, rx) = sync_channel::<LogMsg>(2);
        let h = LoggerHandle { tx };

        h.try_log(LogLevel::Warn, "SETUP failed", "rtspcam::rtsp")
            .expect("capacity available");

        let msg = rx.recv().expect("a message should arrive");
        assert_eq!(msg.level, LogLevel::Warn);
        assert_eq!(msg.text, "SETUP failed");
        assert_eq!(msg.target, "rtspcam::rtsp");
        assert!(msg.ts_ms > 0);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (tx, _rx) = sync_channel::<LogMsg>(1);
        let h = LoggerHandle { tx };

        h.try_log(LogLevel::Info, "first", "t").expect("first fits");
        assert!(matches!(
            h.try_log(LogLevel::Info, "second", "t"),
            Err(TrySendError::Full(_))
        ));
    }

    #[test]
    fn closed_writer_reports_disconnected() {
        let (tx, rx) = sync_channel::<LogMsg>(1);
        drop(rx);
        let h = LoggerHandle { tx };

        assert!(matches!(
            h.try_log(LogLevel::Error, "lost", "t"),
            Err(TrySendError::Disconnected(_))
        ));
    }

    #[test]
    fn log_sink_impl_swallows_errors() {
        let (tx, rx) = sync_channel::<LogMsg>(1);
        drop(rx);
        let h = LoggerHandle { tx };
        // Must not panic.
        h.log(LogLevel::Info, "ignored", "t");
    }
}
