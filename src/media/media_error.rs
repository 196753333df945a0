use std::{fmt, io};

#[derive(Debug)]
pub enum MediaError {
    DecoderInit(String),
    Decode(String),
    WorkerSpawn(String),
    /// The frame does not have the geometry the scaler was built for.
    FrameSizeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    InvalidSize(usize, usize),
    Io(io::Error),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MediaError::*;
        match self {
            DecoderInit(e) => write!(f, "Failed to create H.264 decoder: {e}"),
            Decode(e) => write!(f, "H.264 decode error: {e}"),
            WorkerSpawn(e) => write!(f, "Failed to spawn decoder thread: {e}"),
            FrameSizeMismatch { expected, got } => write!(
                f,
                "frame size changed from {}x{} to {}x{}",
                expected.0, expected.1, got.0, got.1
            ),
            InvalidSize(w, h) => write!(f, "invalid image size {w}x{h}"),
            Io(e) => write!(f, "Io error: {e}"),
        }
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MediaError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MediaError {
    fn from(e: io::Error) -> Self {
        MediaError::Io(e)
    }
}
