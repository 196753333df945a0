//! RTP receive path (RFC 3550): packet parsing, sequence extension and
//! reception statistics for receiver reports.
pub mod rtp_error;
pub mod rtp_header;
pub mod rtp_header_extension;
pub mod rtp_packet;
pub mod rx_tracker;
pub mod seq_ext;
pub mod time;

pub use rtp_error::RtpError;
pub use rtp_header::RtpHeader;
pub use rtp_header_extension::RtpHeaderExtension;
pub use rtp_packet::RtpPacket;
pub use rx_tracker::RxTracker;
pub use seq_ext::SeqExt;

pub const RTP_VERSION: u8 = 2;
