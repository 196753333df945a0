use super::{
    PT_BYE, PT_RR, PT_SDES, PT_SR, RtcpPacketType, bye::Bye, common_header::CommonHeader,
    receiver_report::ReceiverReport, rtcp_error::RtcpError, sdes::Sdes,
    sender_report::SenderReport,
};

/// The RTCP packets understood by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtcpPacket {
    Sr(SenderReport),
    Rr(ReceiverReport),
    Sdes(Sdes),
    Bye(Bye),
    /// Any other packet type (APP, feedback, XR...). Body is not kept.
    Unknown(u8),
}

impl RtcpPacket {
    /// Decodes a compound RTCP datagram.
    ///
    /// Packet types the client does not handle are returned as `Unknown`
    /// instead of failing the whole compound.
    ///
    /// # Errors
    /// Fails on a malformed header or a malformed known packet body.
    pub fn decode_compound(buf: &[u8]) -> Result<Vec<RtcpPacket>, RtcpError> {
        let mut out = Vec::new();
        let mut idx = 0usize;
        while idx < buf.len() {
            let (hdr, total) = CommonHeader::decode(&buf[idx..])?;
            let mut body = &buf[idx + 4..idx + total];
            if hdr.padding() {
                let pad = usize::from(body.last().copied().unwrap_or(0));
                body = body.get(..body.len().saturating_sub(pad)).unwrap_or(&[]);
            }
            let pkt = match hdr.pt() {
                PT_SR => RtcpPacket::Sr(SenderReport::decode(&hdr, body)?),
                PT_RR => RtcpPacket::Rr(ReceiverReport::decode(&hdr, body)?),
                PT_SDES => RtcpPacket::Sdes(Sdes::decode(&hdr, body)?),
                PT_BYE => RtcpPacket::Bye(Bye::decode(&hdr, body)?),
                other => RtcpPacket::Unknown(other),
            };
            out.push(pkt);
            idx += total;
        }
        Ok(out)
    }

    /// Concatenates the packets into one compound datagram.
    ///
    /// # Errors
    /// Propagates per-packet encoding failures. `Unknown` cannot be encoded
    /// and is skipped.
    pub fn encode_compound(pkts: &[RtcpPacket]) -> Result<Vec<u8>, RtcpError> {
        let mut out = Vec::new();
        for pkt in pkts {
            match pkt {
                RtcpPacket::Sr(sr) => sr.encode_into(&mut out)?,
                RtcpPacket::Rr(rr) => rr.encode_into(&mut out)?,
                RtcpPacket::Sdes(sdes) => sdes.encode_into(&mut out)?,
                RtcpPacket::Bye(bye) => bye.encode_into(&mut out)?,
                RtcpPacket::Unknown(_) => {}
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::rtcp::{ReportBlock, SenderInfo};

    #[test]
    fn rr_plus_sdes_compound() {
        let pkts = vec![
            RtcpPacket::Rr(ReceiverReport::new(
                0xAA,
                vec![ReportBlock {
                    ssrc: 0xBB,
                    ..ReportBlock::default()
                }],
            )),
            RtcpPacket::Sdes(Sdes::cname(0xAA, "rtspcam@host")),
        ];
        let bytes = RtcpPacket::encode_compound(&pkts).unwrap();
        assert_eq!(RtcpPacket::decode_compound(&bytes).unwrap(), pkts);
    }

    #[test]
    fn unknown_types_are_skipped_not_fatal() {
        let mut bytes = vec![0x80, 204, 0x00, 0x02, 0, 0, 0, 1, b'n', b'a', b'm', b'e'];
        let sr = SenderReport {
            ssrc: 3,
            info: SenderInfo::default(),
            reports: vec![],
        };
        sr.encode_into(&mut bytes).unwrap();
        let pkts = RtcpPacket::decode_compound(&bytes).unwrap();
        assert_eq!(pkts, vec![RtcpPacket::Unknown(204), RtcpPacket::Sr(sr)]);
    }

    #[test]
    fn truncated_compound_fails() {
        let mut bytes = RtcpPacket::encode_compound(&[RtcpPacket::Bye(Bye::single(1, None))])
            .unwrap();
        bytes.extend_from_slice(&[0x80, 200]);
        assert!(RtcpPacket::decode_compound(&bytes).is_err());
    }
}
