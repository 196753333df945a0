use std::sync::OnceLock;

/// One-shot error flag raised by the RTSP client and polled by the reader.
///
/// The message is published with release semantics and read with acquire
/// semantics, so a reader that sees the flag also sees the whole message.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    message: OnceLock<String>,
}

impl ErrorSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message`. The first call wins; later calls are ignored.
    pub fn set(&self, message: impl Into<String>) {
        let _ = self.message.set(message.into());
    }

    /// Returns the message once [`set`](Self::set) has been called.
    #[must_use]
    pub fn check(&self) -> Option<String> {
        self.message.get().cloned()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.message.get().is_some()
    }
}
