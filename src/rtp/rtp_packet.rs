//! RTP packet parsing and serialization (RFC 3550 §5.1).
use byteorder::{BigEndian, ByteOrder};

use super::{
    RTP_VERSION, rtp_error::RtpError, rtp_header::RtpHeader,
    rtp_header_extension::RtpHeaderExtension,
};

/// Complete RTP packet (header + payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    pub header: RtpHeader,
    /// Payload without trailing padding.
    pub payload: Vec<u8>,
    /// Number of padding bytes removed during decode.
    pub padding_bytes: u8,
}

impl RtpPacket {
    #[must_use]
    pub fn new(header: RtpHeader, payload: Vec<u8>) -> Self {
        Self {
            header,
            payload,
            padding_bytes: 0,
        }
    }

    /// Parses one datagram (or one interleaved frame).
    ///
    /// # Errors
    /// Any inconsistency between the declared header fields and the buffer.
    pub fn decode(buf: &[u8]) -> Result<Self, RtpError> {
        if buf.len() < 12 {
            return Err(RtpError::TooShort);
        }
        let version = buf[0] >> 6;
        if version != RTP_VERSION {
            return Err(RtpError::BadVersion(version));
        }
        let padding = buf[0] & 0x20 != 0;
        let extension = buf[0] & 0x10 != 0;
        let cc = usize::from(buf[0] & 0x0F);
        let marker = buf[1] & 0x80 != 0;
        let payload_type = buf[1] & 0x7F;
        let sequence_number = BigEndian::read_u16(&buf[2..4]);
        let timestamp = BigEndian::read_u32(&buf[4..8]);
        let ssrc = BigEndian::read_u32(&buf[8..12]);

        let mut idx = 12usize;
        if buf.len() < idx + cc * 4 {
            return Err(RtpError::CsrcCountMismatch {
                expected: cc,
                buf_left: buf.len() - idx,
            });
        }
        let csrcs = buf[idx..idx + cc * 4]
            .chunks_exact(4)
            .map(BigEndian::read_u32)
            .collect();
        idx += cc * 4;

        let header_extension = if extension {
            if buf.len() < idx + 4 {
                return Err(RtpError::HeaderExtensionTooShort);
            }
            let profile = BigEndian::read_u16(&buf[idx..idx + 2]);
            let words = usize::from(BigEndian::read_u16(&buf[idx + 2..idx + 4]));
            idx += 4;
            let data = buf
                .get(idx..idx + words * 4)
                .ok_or(RtpError::HeaderExtensionTooShort)?
                .to_vec();
            idx += words * 4;
            Some(RtpHeaderExtension { profile, data })
        } else {
            None
        };

        let mut end = buf.len();
        let mut padding_bytes = 0u8;
        if padding {
            padding_bytes = buf[end - 1];
            if padding_bytes == 0 || end - idx < usize::from(padding_bytes) {
                return Err(RtpError::PaddingTooShort);
            }
            end -= usize::from(padding_bytes);
        }

        Ok(Self {
            header: RtpHeader {
                version,
                padding,
                extension,
                marker,
                payload_type,
                sequence_number,
                timestamp,
                ssrc,
                csrcs,
                header_extension,
            },
            payload: buf[idx..end].to_vec(),
            padding_bytes,
        })
    }

    /// Serializes the packet without padding.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let h = &self.header;
        let cc = u8::try_from(h.csrcs.len().min(15)).unwrap_or(15);
        let mut out = Vec::with_capacity(12 + h.csrcs.len() * 4 + self.payload.len());
        out.push((RTP_VERSION << 6) | (u8::from(h.header_extension.is_some()) << 4) | cc);
        out.push((u8::from(h.marker) << 7) | (h.payload_type & 0x7F));
        out.extend_from_slice(&h.sequence_number.to_be_bytes());
        out.extend_from_slice(&h.timestamp.to_be_bytes());
        out.extend_from_slice(&h.ssrc.to_be_bytes());
        for csrc in h.csrcs.iter().take(usize::from(cc)) {
            out.extend_from_slice(&csrc.to_be_bytes());
        }
        if let Some(ext) = &h.header_extension {
            let words = u16::try_from(ext.data.len().div_ceil(4)).unwrap_or(u16::MAX);
            out.extend_from_slice(&ext.profile.to_be_bytes());
            out.extend_from_slice(&words.to_be_bytes());
            out.extend_from_slice(&ext.data);
            out.extend(std::iter::repeat_n(0u8, usize::from(words) * 4 - ext.data.len()));
        }
        out.extend_from_slice(&self.payload);
        out
    }
}
