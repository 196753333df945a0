use std::{fmt, str::FromStr};

/// Lower transport requested for RTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Udp,
    Tcp,
}

impl FromStr for Transport {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Ok(Transport::Udp),
            "tcp" | "interleaved" => Ok(Transport::Tcp),
            other => Err(format!("unknown transport '{other}'")),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Udp => f.write_str("udp"),
            Transport::Tcp => f.write_str("tcp"),
        }
    }
}

/// Parameters of a `Transport` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportHeader {
    pub transport: Transport,
    pub client_port: Option<(u16, u16)>,
    pub server_port: Option<(u16, u16)>,
    pub interleaved: Option<(u8, u8)>,
    pub ssrc: Option<u32>,
    pub source: Option<String>,
}

impl TransportHeader {
    #[must_use]
    pub fn udp(rtp_port: u16) -> Self {
        Self {
            transport: Transport::Udp,
            client_port: Some((rtp_port, rtp_port.wrapping_add(1))),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn interleaved(rtp_channel: u8) -> Self {
        Self {
            transport: Transport::Tcp,
            interleaved: Some((rtp_channel, rtp_channel.wrapping_add(1))),
            ..Self::default()
        }
    }

    /// Value for a SETUP request.
    #[must_use]
    pub fn to_request_value(&self) -> String {
        match self.transport {
            Transport::Udp => {
                let mut s = "RTP/AVP;unicast".to_string();
                if let Some((a, b)) = self.client_port {
                    s.push_str(&format!(";client_port={a}-{b}"));
                }
                s
            }
            Transport::Tcp => {
                let mut s = "RTP/AVP/TCP;unicast".to_string();
                if let Some((a, b)) = self.interleaved {
                    s.push_str(&format!(";interleaved={a}-{b}"));
                }
                s
            }
        }
    }

    /// Parses a server reply. Only the first transport spec is used.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let spec = value.split(',').next().unwrap_or_default();
        let mut out = Self::default();
        for (i, param) in spec.split(';').enumerate() {
            let param = param.trim();
            if i == 0 {
                if param.to_ascii_uppercase().ends_with("/TCP") {
                    out.transport = Transport::Tcp;
                }
                continue;
            }
            let (key, val) = param.split_once('=').unwrap_or((param, ""));
            match key.to_ascii_lowercase().as_str() {
                "client_port" => out.client_port = parse_pair(val),
                "server_port" => out.server_port = parse_pair(val),
                "interleaved" => out.interleaved = parse_pair(val),
                "ssrc" => out.ssrc = u32::from_str_radix(val.trim(), 16).ok(),
                "source" => out.source = Some(val.trim().to_string()),
                _ => {}
            }
        }
        out
    }
}

/// `a-b` or a single `a`, which implies `a+1`. `None` when either value
/// does not fit `T`.
fn parse_pair<T: TryFrom<u32>>(s: &str) -> Option<(T, T)> {
    let (a, b) = match s.split_once('-') {
        Some((a, b)) => (a.trim().parse::<u32>().ok()?, b.trim().parse::<u32>().ok()?),
        None => {
            let a = s.trim().parse::<u32>().ok()?;
            (a, a.checked_add(1)?)
        }
    };
    Some((T::try_from(a).ok()?, T::try_from(b).ok()?))
}

/// `Session: <id>[;timeout=<secs>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHeader {
    pub id: String,
    pub timeout_secs: u64,
}

impl SessionHeader {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(';');
        let id = parts.next()?.trim();
        if id.is_empty() {
            return None;
        }
        let timeout_secs = parts
            .filter_map(|p| p.trim().split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("timeout"))
            .and_then(|(_, v)| v.trim().parse().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);
        Some(Self {
            id: id.to_string(),
            timeout_secs,
        })
    }

    /// Interval between keep-alive requests for this session.
    #[must_use]
    pub fn keepalive_secs(&self) -> u64 {
        if self.timeout_secs <= 5 {
            1
        } else {
            self.timeout_secs - 5
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn request_values() {
        assert_eq!(
            TransportHeader::udp(50000).to_request_value(),
            "RTP/AVP;unicast;client_port=50000-50001"
        );
        assert_eq!(
            TransportHeader::interleaved(2).to_request_value(),
            "RTP/AVP/TCP;unicast;interleaved=2-3"
        );
    }

    #[test]
    fn parses_udp_reply() {
        let t = TransportHeader::parse(
            "RTP/AVP;unicast;client_port=50000-50001;server_port=6970-6971;ssrc=1A2B3C4D;source=10.0.0.5;mode=\"PLAY\"",
        );
        assert_eq!(t.transport, Transport::Udp);
        assert_eq!(t.client_port, Some((50000, 50001)));
        assert_eq!(t.server_port, Some((6970, 6971)));
        assert_eq!(t.ssrc, Some(0x1A2B_3C4D));
        assert_eq!(t.source.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn parses_tcp_reply_and_single_port() {
        let t = TransportHeader::parse("RTP/AVP/TCP;unicast;interleaved=0-1");
        assert_eq!(t.transport, Transport::Tcp);
        assert_eq!(t.interleaved, Some((0, 1)));
        let t = TransportHeader::parse("RTP/AVP;unicast;server_port=7000");
        assert_eq!(t.server_port, Some((7000, 7001)));
    }

    #[test]
    fn single_value_at_type_limit_is_ignored() {
        let t = TransportHeader::parse("RTP/AVP/TCP;unicast;interleaved=255");
        assert_eq!(t.transport, Transport::Tcp);
        assert_eq!(t.interleaved, None);
        let t = TransportHeader::parse("RTP/AVP;unicast;server_port=65535;client_port=65536-65537");
        assert_eq!(t.server_port, None);
        assert_eq!(t.client_port, None);
        let t = TransportHeader::parse("RTP/AVP/TCP;interleaved=254");
        assert_eq!(t.interleaved, Some((254, 255)));
    }

    #[test]
    fn session_header() {
        let s = SessionHeader::parse("12345678;timeout=30").unwrap();
        assert_eq!(s.id, "12345678");
        assert_eq!(s.timeout_secs, 30);
        assert_eq!(s.keepalive_secs(), 25);
        let s = SessionHeader::parse("abc").unwrap();
        assert_eq!(s.timeout_secs, 60);
        assert_eq!(SessionHeader::parse("x;timeout=5").unwrap().keepalive_secs(), 1);
        assert!(SessionHeader::parse(" ;timeout=5").is_none());
    }

    #[test]
    fn transport_names() {
        assert_eq!("TCP".parse::<Transport>().unwrap(), Transport::Tcp);
        assert!("quic".parse::<Transport>().is_err());
    }
}
