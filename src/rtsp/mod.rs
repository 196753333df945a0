//! RTSP 1.0 client (RFC 2326) with UDP and TCP-interleaved RTP transport.
pub mod auth;
pub mod client;
pub mod connection;
pub mod message;
pub mod rtsp_error;
pub mod transport;
pub mod url;

pub use auth::{Authenticator, Challenge, Credentials};
pub use client::{ClientOptions, RtspClient, SinkFactory, SubsessionInfo};
pub use connection::{RtspConnection, RtspReader};
pub use message::{Incoming, Method, RtspRequest, RtspResponse, parse_incoming};
pub use rtsp_error::RtspError;
pub use transport::{SessionHeader, Transport, TransportHeader};
pub use url::{RtspUrl, resolve_control};
