//! RFC 6184 H.264 RTP depacketizer (single NAL unit, STAP-A and FU-A;
//! packetization modes 0 and 1).
//!
//! Input : RTP payloads in arrival order.
//! Output: complete Annex-B access units, each NAL unit behind a 4-byte
//!         start code.
//!
//! An access unit is emitted when its last packet carries the marker bit,
//! or when a packet with a new timestamp arrives while the pending unit is
//! complete (some cameras never set the marker). Sequence gaps, FU-A
//! continuations without a start, and unsupported aggregation types
//! (STAP-B, MTAP, FU-B) corrupt the pending unit, which is then dropped.

use byteorder::{BigEndian, ByteOrder};

use super::nal::{NalType, START_CODE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUnit {
    /// Annex-B bytes.
    pub data: Vec<u8>,
    /// RTP timestamp shared by all its packets.
    pub timestamp: u32,
    /// `nal_unit_type` of each NAL unit in `data`, in order.
    pub nal_types: Vec<NalType>,
}

impl AccessUnit {
    #[must_use]
    pub fn contains(&self, t: NalType) -> bool {
        self.nal_types.contains(&t)
    }

    #[must_use]
    pub fn is_keyframe(&self) -> bool {
        self.contains(NalType::SliceIdr)
    }
}

#[derive(Debug, Default, Clone)]
pub struct H264Depacketizer {
    cur_ts: Option<u32>,
    last_seq: Option<u16>,
    /// NAL units of the pending access unit, without start codes.
    nalus: Vec<Vec<u8>>,
    /// FU-A reassembly buffer, starting with the reconstructed NAL header.
    fua: Option<Vec<u8>>,
    corrupted: bool,
}

impl H264Depacketizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one RTP payload.
    ///
    /// Returns up to two access units: the previous one when this packet
    /// starts a new timestamp, and the current one when `marker` is set.
    pub fn push_rtp(
        &mut self,
        payload: &[u8],
        marker: bool,
        timestamp: u32,
        seq: u16,
    ) -> Vec<AccessUnit> {
        let mut out = Vec::new();

        let mut gap = false;
        if let Some(last) = self.last_seq {
            if seq == last {
                // Duplicate packet.
                return out;
            }
            gap = seq != last.wrapping_add(1);
        }
        self.last_seq = Some(seq);

        // Lost packets may belong to the pending unit or to the one that
        // starts here; neither is trusted.
        if gap {
            self.corrupted = true;
        }
        match self.cur_ts {
            Some(ts) if ts != timestamp => {
                out.extend(self.finish());
                self.cur_ts = Some(timestamp);
            }
            Some(_) => {}
            None => self.cur_ts = Some(timestamp),
        }
        if gap {
            self.corrupted = true;
        }

        self.handle_payload(payload);

        if marker {
            out.extend(self.finish());
        }
        out
    }

    /// Emits the pending access unit if it is complete, then clears state.
    pub fn flush(&mut self) -> Option<AccessUnit> {
        self.finish()
    }

    fn handle_payload(&mut self, payload: &[u8]) {
        let Some(&header) = payload.first() else {
            self.corrupted = true;
            return;
        };

        match NalType::from_header(header) {
            NalType::StapA => self.handle_stap_a(&payload[1..]),
            NalType::FuA => self.handle_fu_a(payload),
            NalType::StapB | NalType::Mtap16 | NalType::Mtap24 | NalType::FuB => {
                self.corrupted = true;
            }
            NalType::Other(0 | 30 | 31) => self.corrupted = true,
            _ => {
                self.abort_fua();
                self.nalus.push(payload.to_vec());
            }
        }
    }

    fn handle_stap_a(&mut self, mut body: &[u8]) {
        self.abort_fua();
        while !body.is_empty() {
            if body.len() < 2 {
                self.corrupted = true;
                return;
            }
            let size = usize::from(BigEndian::read_u16(&body[..2]));
            let Some(nal) = body.get(2..2 + size).filter(|n| !n.is_empty()) else {
                self.corrupted = true;
                return;
            };
            self.nalus.push(nal.to_vec());
            body = &body[2 + size..];
        }
    }

    fn handle_fu_a(&mut self, payload: &[u8]) {
        if payload.len() < 2 {
            self.corrupted = true;
            return;
        }
        let fu_indicator = payload[0];
        let fu_header = payload[1];
        let start = fu_header & 0x80 != 0;
        let end = fu_header & 0x40 != 0;

        if start {
            self.abort_fua();
            let mut buf = Vec::with_capacity(payload.len() * 4);
            buf.push((fu_indicator & 0xE0) | (fu_header & 0x1F));
            buf.extend_from_slice(&payload[2..]);
            self.fua = Some(buf);
        } else if let Some(buf) = self.fua.as_mut() {
            buf.extend_from_slice(&payload[2..]);
        } else {
            self.corrupted = true;
            return;
        }

        if end {
            if let Some(buf) = self.fua.take() {
                self.nalus.push(buf);
            }
        }
    }

    fn abort_fua(&mut self) {
        if self.fua.take().is_some() {
            self.corrupted = true;
        }
    }

    fn finish(&mut self) -> Option<AccessUnit> {
        let complete = !self.corrupted && self.fua.is_none() && !self.nalus.is_empty();
        let out = complete.then(|| {
            let size = self.nalus.iter().map(|n| n.len() + START_CODE.len()).sum();
            let mut data = Vec::with_capacity(size);
            let mut nal_types = Vec::with_capacity(self.nalus.len());
            for nalu in &self.nalus {
                data.extend_from_slice(&START_CODE);
                data.extend_from_slice(nalu);
                nal_types.push(NalType::from_header(nalu[0]));
            }
            AccessUnit {
                data,
                timestamp: self.cur_ts.unwrap_or_default(),
                nal_types,
            }
        });

        self.nalus.clear();
        self.fua = None;
        self.corrupted = false;
        out
    }
}
