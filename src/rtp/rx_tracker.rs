use super::{
    seq_ext::SeqExt,
    time::{ntp_compact, ntp_now},
};
use crate::rtcp::ReportBlock;

/// Per-source reception statistics (RFC 3550 §6.4.1, appendix A.3 and A.8).
#[derive(Debug, Default, Clone)]
pub struct RxTracker {
    seqext: SeqExt,
    base_ext_seq: Option<u32>,
    highest_ext_seq: u32,
    received: u32,
    expected_prev: u32,
    received_prev: u32,

    /// Interarrival jitter in RTP timestamp units, scaled by 16.
    jitter_q4: u64,
    last_transit: Option<u32>,

    last_sr_compact: Option<u32>,
    last_sr_arrival_compact: Option<u32>,
}

impl RxTracker {
    /// Records one RTP packet. `arrival_rtp_units` is the arrival time
    /// expressed in the stream's RTP clock, from a monotonic source.
    pub fn on_rtp(&mut self, seq: u16, rtp_ts: u32, arrival_rtp_units: u32) {
        let ext = self.seqext.update(seq);
        let base = *self.base_ext_seq.get_or_insert(ext);
        if ext > self.highest_ext_seq || self.highest_ext_seq < base {
            self.highest_ext_seq = ext;
        }
        self.received = self.received.wrapping_add(1);

        let transit = arrival_rtp_units.wrapping_sub(rtp_ts);
        if let Some(prev) = self.last_transit {
            // Signed distance handles wrap of either clock.
            #[allow(clippy::cast_possible_wrap)]
            let d = u64::from((transit.wrapping_sub(prev) as i32).unsigned_abs());
            // J += (|D| - J) / 16, kept in 1/16 units.
            self.jitter_q4 = self.jitter_q4 + d - (self.jitter_q4 + 8) / 16;
        }
        self.last_transit = Some(transit);
    }

    /// Remembers the last SR so the next report can carry LSR/DLSR.
    pub fn on_sr_received(&mut self, ntp_secs: u32, ntp_frac: u32, now_ntp: (u32, u32)) {
        self.last_sr_compact = Some(ntp_compact(ntp_secs, ntp_frac));
        self.last_sr_arrival_compact = Some(ntp_compact(now_ntp.0, now_ntp.1));
    }

    #[must_use]
    pub fn jitter(&self) -> u32 {
        u32::try_from(self.jitter_q4 / 16).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn packets_received(&self) -> u32 {
        self.received
    }

    #[must_use]
    pub fn expected(&self) -> u32 {
        match self.base_ext_seq {
            Some(base) => self.highest_ext_seq.wrapping_sub(base).wrapping_add(1),
            None => 0,
        }
    }

    /// Builds a report block for `ssrc` and starts a new loss interval.
    pub fn build_report_block(&mut self, ssrc: u32) -> ReportBlock {
        let expected = self.expected();
        let cumulative_lost = i64::from(expected) - i64::from(self.received);

        let exp_delta = expected.wrapping_sub(self.expected_prev);
        let rec_delta = self.received.wrapping_sub(self.received_prev);
        let lost_delta = exp_delta.saturating_sub(rec_delta);
        let fraction_lost = if exp_delta == 0 {
            0
        } else {
            u8::try_from((u64::from(lost_delta) << 8) / u64::from(exp_delta)).unwrap_or(u8::MAX)
        };
        self.expected_prev = expected;
        self.received_prev = self.received;

        let (lsr, dlsr) = match (self.last_sr_compact, self.last_sr_arrival_compact) {
            (Some(lsr), Some(arrival)) => {
                let (s, f) = ntp_now();
                (lsr, ntp_compact(s, f).wrapping_sub(arrival))
            }
            _ => (0, 0),
        };

        ReportBlock {
            ssrc,
            fraction_lost,
            cumulative_lost: i32::try_from(cumulative_lost.clamp(-8_388_608, 8_388_607))
                .unwrap_or_default(),
            highest_seq_no_received: self.highest_ext_seq,
            interarrival_jitter: self.jitter(),
            lsr,
            dlsr,
        }
    }
}
