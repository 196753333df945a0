use byteorder::{BigEndian, ByteOrder};

use super::{RTCP_VERSION, rtcp_error::RtcpError};

/// First 32-bit word shared by every RTCP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonHeader {
    padding: bool,
    rc_or_fmt: u8,
    pt: u8,
    /// Packet length in 32-bit words minus one.
    length_words: u16,
}

impl CommonHeader {
    #[must_use]
    pub fn new(rc_or_fmt: u8, pt: u8) -> Self {
        Self {
            padding: false,
            rc_or_fmt: rc_or_fmt & 0x1F,
            pt,
            length_words: 0,
        }
    }

    /// Decodes the header and returns it with the full packet size in bytes.
    ///
    /// # Errors
    /// `TooShort` when `buf` is shorter than the header or the declared length.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), RtcpError> {
        if buf.len() < 4 {
            return Err(RtcpError::TooShort);
        }
        let version = buf[0] >> 6;
        if version != RTCP_VERSION {
            return Err(RtcpError::BadVersion(version));
        }
        let length_words = BigEndian::read_u16(&buf[2..4]);
        let total_bytes = (usize::from(length_words) + 1) * 4;
        if buf.len() < total_bytes {
            return Err(RtcpError::TooShort);
        }
        Ok((
            Self {
                padding: (buf[0] >> 5) & 1 != 0,
                rc_or_fmt: buf[0] & 0x1F,
                pt: buf[1],
                length_words,
            },
            total_bytes,
        ))
    }

    /// Appends the header with a zero length; see [`finish_packet`].
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push((RTCP_VERSION << 6) | (u8::from(self.padding) << 5) | self.rc_or_fmt);
        out.push(self.pt);
        out.extend_from_slice(&self.length_words.to_be_bytes());
    }

    #[must_use]
    pub fn padding(&self) -> bool {
        self.padding
    }

    #[must_use]
    pub fn rc_or_fmt(&self) -> u8 {
        self.rc_or_fmt
    }

    #[must_use]
    pub fn pt(&self) -> u8 {
        self.pt
    }

    #[must_use]
    pub fn length_words(&self) -> u16 {
        self.length_words
    }
}

/// Pads the packet that begins at `start` to a word boundary and patches its
/// length field.
pub fn finish_packet(out: &mut Vec<u8>, start: usize) {
    let pad = (4 - (out.len() - start) % 4) % 4;
    out.extend(std::iter::repeat_n(0u8, pad));
    let len_words = u16::try_from((out.len() - start) / 4 - 1).unwrap_or(u16::MAX);
    BigEndian::write_u16(&mut out[start + 2..start + 4], len_words);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn decode_reports_total_size() {
        let buf = [0x81, 201, 0x00, 0x01, 0, 0, 0, 7];
        let (hdr, total) = CommonHeader::decode(&buf).unwrap();
        assert_eq!(total, 8);
        assert_eq!(hdr.rc_or_fmt(), 1);
        assert_eq!(hdr.pt(), 201);
        assert!(!hdr.padding());
    }

    #[test]
    fn declared_length_beyond_buffer_is_rejected() {
        let buf = [0x80, 200, 0x00, 0x06, 0, 0, 0, 0];
        assert_eq!(CommonHeader::decode(&buf), Err(RtcpError::TooShort));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let buf = [0x40, 200, 0, 0];
        assert_eq!(CommonHeader::decode(&buf), Err(RtcpError::BadVersion(1)));
    }

    #[test]
    fn finish_pads_and_patches_length() {
        let mut out = Vec::new();
        CommonHeader::new(0, 203).encode_into(&mut out);
        out.extend_from_slice(&[1, 2, 3, 4, 5]);
        finish_packet(&mut out, 0);
        assert_eq!(out.len(), 12);
        assert_eq!(&out[2..4], &[0, 2]);
    }
}
