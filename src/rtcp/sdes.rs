use byteorder::{BigEndian, ByteOrder};

use super::{
    PT_SDES, RtcpPacketType,
    common_header::{CommonHeader, finish_packet},
    rtcp_error::RtcpError,
};

/// SDES items. Only CNAME is ever sent; the rest are kept when received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdesItem {
    Cname(String),
    Name(String),
    Tool(String),
    Other(u8, Vec<u8>),
}

impl SdesItem {
    fn to_wire(&self) -> (u8, &[u8]) {
        match self {
            SdesItem::Cname(s) => (1, s.as_bytes()),
            SdesItem::Name(s) => (2, s.as_bytes()),
            SdesItem::Tool(s) => (6, s.as_bytes()),
            SdesItem::Other(t, v) => (*t, v.as_slice()),
        }
    }

    fn from_wire(t: u8, data: &[u8]) -> Self {
        let text = || String::from_utf8_lossy(data).into_owned();
        match t {
            1 => SdesItem::Cname(text()),
            2 => SdesItem::Name(text()),
            6 => SdesItem::Tool(text()),
            _ => SdesItem::Other(t, data.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SdesChunk {
    pub ssrc: u32,
    pub items: Vec<SdesItem>,
}

impl SdesChunk {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), RtcpError> {
        let start = out.len();
        out.extend_from_slice(&self.ssrc.to_be_bytes());
        for item in &self.items {
            let (t, data) = item.to_wire();
            let len = u8::try_from(data.len()).map_err(|_| RtcpError::SdesItemTooLong)?;
            out.push(t);
            out.push(len);
            out.extend_from_slice(data);
        }
        // END item, then pad the chunk to a word boundary.
        out.push(0);
        let rem = (out.len() - start) % 4;
        if rem != 0 {
            out.extend(std::iter::repeat_n(0u8, 4 - rem));
        }
        Ok(())
    }

    fn decode(buf: &[u8]) -> Result<(Self, usize), RtcpError> {
        if buf.len() < 4 {
            return Err(RtcpError::TooShort);
        }
        let ssrc = BigEndian::read_u32(&buf[0..4]);
        let mut idx = 4usize;
        let mut items = Vec::new();

        while idx < buf.len() {
            let t = buf[idx];
            idx += 1;
            if t == 0 {
                idx += (4 - idx % 4) % 4;
                if idx > buf.len() {
                    return Err(RtcpError::Truncated);
                }
                break;
            }
            let len = usize::from(*buf.get(idx).ok_or(RtcpError::SdesItemTooShort)?);
            idx += 1;
            let data = buf
                .get(idx..idx + len)
                .ok_or(RtcpError::SdesItemTooShort)?;
            idx += len;
            items.push(SdesItem::from_wire(t, data));
        }

        Ok((Self { ssrc, items }, idx))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sdes {
    pub chunks: Vec<SdesChunk>,
}

impl Sdes {
    pub fn cname(ssrc: u32, cname: impl Into<String>) -> Self {
        Self {
            chunks: vec![SdesChunk {
                ssrc,
                items: vec![SdesItem::Cname(cname.into())],
            }],
        }
    }
}

impl RtcpPacketType for Sdes {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), RtcpError> {
        let sc = u8::try_from(self.chunks.len())
            .ok()
            .filter(|&n| n <= 31)
            .ok_or(RtcpError::TooManyReportBlocks(self.chunks.len()))?;
        let start = out.len();
        CommonHeader::new(sc, PT_SDES).encode_into(out);
        for ch in &self.chunks {
            ch.encode_into(out)?;
        }
        finish_packet(out, start);
        Ok(())
    }

    fn decode(hdr: &CommonHeader, payload: &[u8]) -> Result<Self, RtcpError> {
        let mut chunks = Vec::with_capacity(usize::from(hdr.rc_or_fmt()));
        let mut idx = 0usize;
        while chunks.len() < usize::from(hdr.rc_or_fmt()) && idx + 4 <= payload.len() {
            let (chunk, used) = SdesChunk::decode(&payload[idx..])?;
            chunks.push(chunk);
            idx += used;
        }
        Ok(Self { chunks })
    }
}
