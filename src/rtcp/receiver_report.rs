use byteorder::{BigEndian, ByteOrder};

use super::{
    PT_RR, RtcpPacketType,
    common_header::{CommonHeader, finish_packet},
    report_block::{REPORT_BLOCK_LEN, ReportBlock},
    rtcp_error::RtcpError,
};

const MAX_RC: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceiverReport {
    pub ssrc: u32,
    pub reports: Vec<ReportBlock>,
}

impl ReceiverReport {
    #[must_use]
    pub fn new(ssrc: u32, reports: Vec<ReportBlock>) -> Self {
        Self { ssrc, reports }
    }
}

impl RtcpPacketType for ReceiverReport {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), RtcpError> {
        let rc = u8::try_from(self.reports.len())
            .ok()
            .filter(|&n| usize::from(n) <= MAX_RC)
            .ok_or(RtcpError::TooManyReportBlocks(self.reports.len()))?;
        let start = out.len();
        CommonHeader::new(rc, PT_RR).encode_into(out);
        out.extend_from_slice(&self.ssrc.to_be_bytes());
        for rb in &self.reports {
            rb.encode_into(out);
        }
        finish_packet(out, start);
        Ok(())
    }

    fn decode(hdr: &CommonHeader, payload: &[u8]) -> Result<Self, RtcpError> {
        if payload.len() < 4 {
            return Err(RtcpError::TooShort);
        }
        let rc = usize::from(hdr.rc_or_fmt());
        let reports = payload[4..]
            .chunks_exact(REPORT_BLOCK_LEN)
            .take(rc)
            .map(ReportBlock::decode)
            .collect::<Result<Vec<_>, _>>()?;
        if reports.len() != rc {
            return Err(RtcpError::Truncated);
        }
        Ok(Self {
            ssrc: BigEndian::read_u32(&payload[0..4]),
            reports,
        })
    }
}
