//! RTCP (RFC 3550 §6) packets a receiving client needs: SR and BYE from the
//! camera, RR and SDES back to it.
pub mod bye;
pub mod common_header;
pub mod receiver_report;
pub mod report_block;
pub mod rtcp_error;
pub mod rtcp_packet;
pub mod sdes;
pub mod sender_report;

pub use bye::Bye;
pub use common_header::CommonHeader;
pub use receiver_report::ReceiverReport;
pub use report_block::ReportBlock;
pub use rtcp_error::RtcpError;
pub use rtcp_packet::RtcpPacket;
pub use sdes::{Sdes, SdesChunk, SdesItem};
pub use sender_report::{SenderInfo, SenderReport};

pub const RTCP_VERSION: u8 = 2;

pub const PT_SR: u8 = 200;
pub const PT_RR: u8 = 201;
pub const PT_SDES: u8 = 202;
pub const PT_BYE: u8 = 203;

/// Encoding and decoding of one RTCP packet type.
pub trait RtcpPacketType: Sized {
    /// Appends the packet including its common header.
    ///
    /// # Errors
    /// Fails when a count does not fit its header field.
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), RtcpError>;

    /// Decodes the body that follows `hdr`.
    ///
    /// # Errors
    /// Fails on truncated or inconsistent bodies.
    fn decode(hdr: &CommonHeader, payload: &[u8]) -> Result<Self, RtcpError>;
}
