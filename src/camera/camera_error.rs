use std::fmt;

use crate::{media::MediaError, rtsp::RtspError};

#[derive(Debug)]
pub enum CameraError {
    Rtsp(RtspError),
    Media(MediaError),
    /// The session failed; carries the client's message.
    Stream(String),
    /// The server ended the stream.
    EndOfStream,
    Config(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CameraError::*;
        match self {
            Rtsp(e) => write!(f, "{e}"),
            Media(e) => write!(f, "{e}"),
            Stream(msg) => write!(f, "{msg}"),
            EndOfStream => write!(f, "end of stream"),
            Config(e) => write!(f, "configuration error: {e}"),
        }
    }
}

impl std::error::Error for CameraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CameraError::Rtsp(e) => Some(e),
            CameraError::Media(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RtspError> for CameraError {
    fn from(e: RtspError) -> Self {
        CameraError::Rtsp(e)
    }
}

impl From<MediaError> for CameraError {
    fn from(e: MediaError) -> Self {
        CameraError::Media(e)
    }
}
