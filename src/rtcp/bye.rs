use byteorder::{BigEndian, ByteOrder};

use super::{
    PT_BYE, RtcpPacketType,
    common_header::{CommonHeader, finish_packet},
    rtcp_error::RtcpError,
};

/// Goodbye: the listed sources are leaving the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bye {
    pub sources: Vec<u32>,
    pub reason: Option<String>,
}

impl Bye {
    #[must_use]
    pub fn single(ssrc: u32, reason: Option<String>) -> Self {
        Self {
            sources: vec![ssrc],
            reason,
        }
    }
}

impl RtcpPacketType for Bye {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), RtcpError> {
        let sc = u8::try_from(self.sources.len())
            .ok()
            .filter(|&n| n <= 31)
            .ok_or(RtcpError::TooManyByeSources(self.sources.len()))?;
        let start = out.len();
        CommonHeader::new(sc, PT_BYE).encode_into(out);
        for ssrc in &self.sources {
            out.extend_from_slice(&ssrc.to_be_bytes());
        }
        if let Some(reason) = &self.reason {
            let bytes = reason.as_bytes();
            let len = bytes.len().min(255);
            out.push(u8::try_from(len).unwrap_or(u8::MAX));
            out.extend_from_slice(&bytes[..len]);
        }
        finish_packet(out, start);
        Ok(())
    }

    fn decode(hdr: &CommonHeader, payload: &[u8]) -> Result<Self, RtcpError> {
        let sc = usize::from(hdr.rc_or_fmt());
        if payload.len() < sc * 4 {
            return Err(RtcpError::Truncated);
        }
        let sources = payload[..sc * 4]
            .chunks_exact(4)
            .map(BigEndian::read_u32)
            .collect();
        let rest = &payload[sc * 4..];
        let reason = match rest.split_first() {
            Some((&len, text)) if len > 0 => {
                let text = text.get(..usize::from(len)).ok_or(RtcpError::Truncated)?;
                Some(String::from_utf8_lossy(text).into_owned())
            }
            _ => None,
        };
        Ok(Self { sources, reason })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn bye_with_reason() {
        let bye = Bye::single(0xCAFE, Some("camera shutting down".into()));
        let mut out = Vec::new();
        bye.encode_into(&mut out).unwrap();
        assert_eq!(out.len() % 4, 0);
        let (hdr, total) = CommonHeader::decode(&out).unwrap();
        assert_eq!(total, out.len());
        assert_eq!(Bye::decode(&hdr, &out[4..total]).unwrap(), bye);
    }

    #[test]
    fn bye_without_reason() {
        let mut out = Vec::new();
        Bye::single(5, None).encode_into(&mut out).unwrap();
        assert_eq!(out, vec![0x81, PT_BYE, 0, 1, 0, 0, 0, 5]);
        let (hdr, _) = CommonHeader::decode(&out).unwrap();
        assert_eq!(Bye::decode(&hdr, &out[4..]).unwrap().reason, None);
    }

    #[test]
    fn reason_longer_than_payload_is_truncation() {
        let hdr = CommonHeader::new(0, PT_BYE);
        assert_eq!(Bye::decode(&hdr, &[10, b'a', 0, 0]), Err(RtcpError::Truncated));
    }
}
