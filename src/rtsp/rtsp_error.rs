use std::{fmt, io};

use crate::sdp::SdpError;

#[derive(Debug)]
pub enum RtspError {
    InvalidUrl(String),
    Io(io::Error),
    Connect { addr: String, source: io::Error },
    /// A message that is not valid RTSP/1.0.
    Malformed(String),
    /// Non-2xx reply.
    Status {
        method: &'static str,
        code: u16,
        reason: String,
    },
    Unauthorized(String),
    /// DESCRIBE was answered with an error status.
    DescribeFailed(String),
    Sdp(SdpError),
    NoMedia,
    SinkCreation(String),
    /// No reply within the response timeout.
    Timeout(&'static str),
    ConnectionClosed,
    NoVideoSubsession,
    Aborted,
}

impl fmt::Display for RtspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RtspError::*;
        match self {
            InvalidUrl(e) => write!(f, "invalid RTSP URL: {e}"),
            Io(e) => write!(f, "Io error: {e}"),
            Connect { addr, source } => write!(f, "Failed to connect to {addr}: {source}"),
            Malformed(e) => write!(f, "malformed RTSP message: {e}"),
            Status {
                method,
                code,
                reason,
            } => write!(f, "{method} failed: {code} {reason}"),
            Unauthorized(e) => write!(f, "authentication failed: {e}"),
            DescribeFailed(e) => write!(f, "Failed to get a SDP description: {e}"),
            Sdp(e) => write!(f, "Failed to parse the SDP description: {e}"),
            NoMedia => write!(f, "This session has no media subsessions"),
            SinkCreation(e) => write!(f, "Failed to create a data sink: {e}"),
            Timeout(method) => write!(f, "no response to {method}"),
            ConnectionClosed => write!(f, "RTSP connection closed by server"),
            NoVideoSubsession => write!(f, "no H264 video subsession"),
            Aborted => write!(f, "aborted"),
        }
    }
}

impl std::error::Error for RtspError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RtspError::Io(e) | RtspError::Connect { source: e, .. } => Some(e),
            RtspError::Sdp(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RtspError {
    fn from(e: io::Error) -> Self {
        RtspError::Io(e)
    }
}

impl From<SdpError> for RtspError {
    fn from(e: SdpError) -> Self {
        RtspError::Sdp(e)
    }
}
