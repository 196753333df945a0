use std::sync::Arc;

use crate::{
    h264::{AccessUnit, H264Depacketizer, NalType, format_hex_line, split_annexb},
    log::LogSink,
    rtp::RtpPacket,
    sink_debug, sink_info, sink_trace,
};

/// Receiver of complete Annex-B access units.
pub trait AccessUnitSink: Send {
    fn on_access_unit(&mut self, au: &[u8]);
}

/// Per-subsession consumer of H.264 RTP packets.
///
/// Nothing is forwarded until the decoder can start: with out-of-band
/// parameter sets that is the first IDR (prefixed with them unless it
/// carries its own SPS), otherwise the first access unit holding an SPS.
pub struct VideoSink {
    name: String,
    depacketizer: H264Depacketizer,
    extradata: Vec<u8>,
    waiting: bool,
    target: Box<dyn AccessUnitSink>,
    delivered: u64,
    logger: Arc<dyn LogSink>,
}

impl VideoSink {
    pub fn new(
        name: impl Into<String>,
        extradata: Vec<u8>,
        target: Box<dyn AccessUnitSink>,
        logger: Arc<dyn LogSink>,
    ) -> Self {
        let name = name.into();
        for nal in split_annexb(&extradata) {
            sink_trace!(logger, "{}", format_hex_line("extradata", nal));
        }
        Self {
            name,
            depacketizer: H264Depacketizer::new(),
            extradata,
            waiting: true,
            target,
            delivered: 0,
            logger,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Access units handed to the target so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn on_rtp(&mut self, pkt: &RtpPacket) {
        let aus = self.depacketizer.push_rtp(
            &pkt.payload,
            pkt.header.marker,
            pkt.header.timestamp,
            pkt.header.sequence_number,
        );
        for au in aus {
            self.on_access_unit(&au);
        }
    }

    /// Delivers a complete access unit still held by the depacketizer.
    pub fn close(&mut self) {
        if let Some(au) = self.depacketizer.flush() {
            self.on_access_unit(&au);
        }
        sink_debug!(
            self.logger,
            "[VideoSink] {} closed after {} access units",
            self.name,
            self.delivered
        );
    }

    fn on_access_unit(&mut self, au: &AccessUnit) {
        self.log_parameter_sets(au);

        if self.waiting {
            let has_sps = au.contains(NalType::Sps);
            let start = if self.extradata.is_empty() {
                has_sps
            } else {
                au.is_keyframe()
            };
            if !start {
                sink_trace!(
                    self.logger,
                    "[VideoSink] {} dropping access unit before first keyframe",
                    self.name
                );
                return;
            }
            self.waiting = false;
            sink_info!(
                self.logger,
                "[VideoSink] {} starting at RTP timestamp {}",
                self.name,
                au.timestamp
            );

            if !has_sps && !self.extradata.is_empty() {
                let mut data = Vec::with_capacity(self.extradata.len() + au.data.len());
                data.extend_from_slice(&self.extradata);
                data.extend_from_slice(&au.data);
                self.deliver(&data);
                return;
            }
        }
        self.deliver(&au.data);
    }

    fn deliver(&mut self, data: &[u8]) {
        self.target.on_access_unit(data);
        self.delivered += 1;
    }

    fn log_parameter_sets(&self, au: &AccessUnit) {
        if !au.contains(NalType::Sps) && !au.contains(NalType::Pps) {
            return;
        }
        for nal in split_annexb(&au.data) {
            match NalType::from_header(nal[0]) {
                NalType::Sps => sink_trace!(self.logger, "{}", format_hex_line("sps", nal)),
                NalType::Pps => sink_trace!(self.logger, "{}", format_hex_line("pps", nal)),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::{h264::START_CODE, log::NoopLogSink, rtp::RtpHeader};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<Vec<u8>>>>);

    impl AccessUnitSink for Collect {
        fn on_access_unit(&mut self, au: &[u8]) {
            self.0.lock().unwrap().push(au.to_vec());
        }
    }

    fn sink(extradata: Vec<u8>) -> (VideoSink, Collect) {
        let out = Collect::default();
        let s = VideoSink::new("video", extradata, Box::new(out.clone()), Arc::new(NoopLogSink));
        (s, out)
    }

    fn pkt(payload: &[u8], seq: u16, ts: u32) -> RtpPacket {
        RtpPacket::new(RtpHeader::new(96, seq, ts, 0x1234).with_marker(true), payload.to_vec())
    }

    fn annexb(nalus: &[&[u8]]) -> Vec<u8> {
        nalus
            .iter()
            .flat_map(|n| START_CODE.iter().chain(n.iter()).copied())
            .collect()
    }

    const SPS: &[u8] = &[0x67, 0x42, 0x00, 0x1F];
    const PPS: &[u8] = &[0x68, 0xCE, 0x3C, 0x80];
    const IDR: &[u8] = &[0x65, 0x88, 0x84];
    const P: &[u8] = &[0x41, 0x9A, 0x02];

    #[test]
    fn without_extradata_waits_for_sps() {
        let (mut s, out) = sink(Vec::new());
        s.on_rtp(&pkt(P, 1, 10));
        s.on_rtp(&pkt(IDR, 2, 20));
        assert!(out.0.lock().unwrap().is_empty());

        let mut stap = vec![0x78];
        for n in [SPS, PPS] {
            stap.extend_from_slice(&u16::try_from(n.len()).unwrap().to_be_bytes());
            stap.extend_from_slice(n);
        }
        let mut first = pkt(&stap, 3, 30);
        first.header.marker = false;
        s.on_rtp(&first);
        s.on_rtp(&pkt(IDR, 4, 30));
        s.on_rtp(&pkt(P, 5, 40));

        let got = out.0.lock().unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], annexb(&[SPS, PPS, IDR]));
        assert_eq!(got[1], annexb(&[P]));
        assert_eq!(s.delivered(), 2);
    }

    #[test]
    fn extradata_prefixes_first_idr() {
        let (mut s, out) = sink(annexb(&[SPS, PPS]));
        s.on_rtp(&pkt(P, 1, 10));
        s.on_rtp(&pkt(IDR, 2, 20));
        s.on_rtp(&pkt(P, 3, 30));
        s.on_rtp(&pkt(IDR, 4, 40));

        let got = out.0.lock().unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0], annexb(&[SPS, PPS, IDR]));
        assert_eq!(got[1], annexb(&[P]));
        assert_eq!(got[2], annexb(&[IDR]));
    }

    #[test]
    fn in_band_sps_is_not_doubled() {
        let (mut s, out) = sink(annexb(&[SPS, PPS]));
        let mut a = pkt(SPS, 1, 10);
        a.header.marker = false;
        s.on_rtp(&a);
        s.on_rtp(&pkt(IDR, 2, 10));
        assert_eq!(out.0.lock().unwrap()[0], annexb(&[SPS, IDR]));
    }

    #[test]
    fn close_flushes_pending_unit() {
        let (mut s, out) = sink(annexb(&[SPS, PPS]));
        s.on_rtp(&pkt(IDR, 1, 10));
        let mut p = pkt(P, 2, 20);
        p.header.marker = false;
        s.on_rtp(&p);
        s.close();
        assert_eq!(out.0.lock().unwrap().len(), 2);
        assert_eq!(s.name(), "video");
    }
}
