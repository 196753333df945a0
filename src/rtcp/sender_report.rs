use byteorder::{BigEndian, ByteOrder};

use super::{
    PT_SR, RtcpPacketType,
    common_header::{CommonHeader, finish_packet},
    report_block::{REPORT_BLOCK_LEN, ReportBlock},
    rtcp_error::RtcpError,
};

const MAX_RC: usize = 31;

/// Sender info section of an SR.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SenderInfo {
    pub ntp_msw: u32,
    pub ntp_lsw: u32,
    pub rtp_ts: u32,
    pub packet_count: u32,
    pub octet_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SenderReport {
    pub ssrc: u32,
    pub info: SenderInfo,
    pub reports: Vec<ReportBlock>,
}

impl RtcpPacketType for SenderReport {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), RtcpError> {
        let rc = u8::try_from(self.reports.len())
            .ok()
            .filter(|&n| usize::from(n) <= MAX_RC)
            .ok_or(RtcpError::TooManyReportBlocks(self.reports.len()))?;
        let start = out.len();
        CommonHeader::new(rc, PT_SR).encode_into(out);
        for word in [
            self.ssrc,
            self.info.ntp_msw,
            self.info.ntp_lsw,
            self.info.rtp_ts,
            self.info.packet_count,
            self.info.octet_count,
        ] {
            out.extend_from_slice(&word.to_be_bytes());
        }
        for rb in &self.reports {
            rb.encode_into(out);
        }
        finish_packet(out, start);
        Ok(())
    }

    fn decode(hdr: &CommonHeader, payload: &[u8]) -> Result<Self, RtcpError> {
        if payload.len() < 24 {
            return Err(RtcpError::TooShort);
        }
        let info = SenderInfo {
            ntp_msw: BigEndian::read_u32(&payload[4..8]),
            ntp_lsw: BigEndian::read_u32(&payload[8..12]),
            rtp_ts: BigEndian::read_u32(&payload[12..16]),
            packet_count: BigEndian::read_u32(&payload[16..20]),
            octet_count: BigEndian::read_u32(&payload[20..24]),
        };
        let reports = payload[24..]
            .chunks_exact(REPORT_BLOCK_LEN)
            .take(usize::from(hdr.rc_or_fmt()))
            .map(ReportBlock::decode)
            .collect::<Result<Vec<_>, _>>()?;
        if reports.len() != usize::from(hdr.rc_or_fmt()) {
            return Err(RtcpError::Truncated);
        }
        Ok(Self {
            ssrc: BigEndian::read_u32(&payload[0..4]),
            info,
            reports,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn encode_then_decode_sender_info() {
        let sr = SenderReport {
            ssrc: 0x1122_3344,
            info: SenderInfo {
                ntp_msw: 0xE000_0000,
                ntp_lsw: 0x8000_0000,
                rtp_ts: 90_000,
                packet_count: 10,
                octet_count: 12_000,
            },
            reports: vec![],
        };
        let mut out = Vec::new();
        sr.encode_into(&mut out).unwrap();
        assert_eq!(out.len(), 28);
        let (hdr, total) = CommonHeader::decode(&out).unwrap();
        assert_eq!(total, 28);
        assert_eq!(SenderReport::decode(&hdr, &out[4..]).unwrap(), sr);
    }

    #[test]
    fn missing_report_blocks_are_truncation() {
        let mut out = Vec::new();
        SenderReport::default().encode_into(&mut out).unwrap();
        let hdr = CommonHeader::new(1, PT_SR);
        assert_eq!(
            SenderReport::decode(&hdr, &out[4..]),
            Err(RtcpError::Truncated)
        );
    }
}
