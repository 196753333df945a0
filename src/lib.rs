//! rtspcam pulls H.264 video from RTSP cameras and hands out decoded
//! RGB/BGR images.
//!
//! [`camera::RtspCamera`] is the entry point: it runs an RTSP session on a
//! background thread, decodes on another and converts the newest picture
//! when [`camera::RtspCamera::read`] is called. Lower layers are public for
//! tools that need raw access units or protocol pieces.

/// Public camera API.
pub mod camera;
/// Shared command line arguments of the bundled tools.
pub mod cli;
/// INI-style configuration.
pub mod config;
/// Hex log to binary stream conversion.
pub mod convert;
/// H.264 bitstream helpers and RTP depacketization.
pub mod h264;
/// Leveled, non-blocking logging.
pub mod log;
/// Decoding, colour conversion and images.
pub mod media;
/// RTCP packet parsing and building.
pub mod rtcp;
/// RTP packet parsing and reception statistics.
pub mod rtp;
/// RTSP client.
pub mod rtsp;
/// Session description parsing.
pub mod sdp;
/// Thread hand-off primitives.
pub mod sync;
