use std::{collections::HashMap, fmt, str::FromStr};

use super::{
    attribute::{Attribute, find_value},
    bandwidth::Bandwidth,
    connection::Connection,
    sdp_error::SdpError,
    session::NptRange,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Text,
    Application,
    Message,
    Other(String),
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
            MediaKind::Text => f.write_str("text"),
            MediaKind::Application => f.write_str("application"),
            MediaKind::Message => f.write_str("message"),
            MediaKind::Other(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MediaKind {
    fn from(s: &str) -> Self {
        match s {
            "audio" => Self::Audio,
            "video" => Self::Video,
            "text" => Self::Text,
            "application" => Self::Application,
            "message" => Self::Message,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Parsed `a=rtpmap:<pt> <encoding>/<clock>[/<channels>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMap {
    pub payload_type: u8,
    pub encoding: String,
    pub clock_rate: u32,
    pub channels: Option<u16>,
}

impl FromStr for RtpMap {
    type Err = SdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pt, rest) = s
            .trim()
            .split_once(char::is_whitespace)
            .ok_or(SdpError::Invalid("a=rtpmap"))?;
        let mut it = rest.trim().split('/');
        let encoding = it
            .next()
            .filter(|e| !e.is_empty())
            .ok_or(SdpError::Invalid("a=rtpmap"))?;
        let clock_rate = it
            .next()
            .ok_or(SdpError::Missing("a=rtpmap clock rate"))?
            .trim()
            .parse()?;
        let channels = it.next().map(|c| c.trim().parse()).transpose()?;
        Ok(Self {
            payload_type: pt.parse()?,
            encoding: encoding.to_string(),
            clock_rate,
            channels,
        })
    }
}

/// One `m=` section and the lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    pub port: u16,
    /// The `/<count>` part of the port field.
    pub num_ports: Option<u16>,
    pub proto: String,
    /// Format tokens, usually RTP payload types.
    pub fmts: Vec<String>,
    pub title: Option<String>,
    pub connection: Option<Connection>,
    pub bandwidth: Vec<Bandwidth>,
    pub attrs: Vec<Attribute>,
    pub extra_lines: Vec<String>,
}

impl FromStr for Media {
    type Err = SdpError;

    /// Parses the value of an `m=` line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut p = s.split_whitespace();
        let (Some(kind), Some(port_tok), Some(proto)) = (p.next(), p.next(), p.next()) else {
            return Err(SdpError::Invalid("m="));
        };
        let (port, num_ports) = match port_tok.split_once('/') {
            Some((base, n)) => (base.parse()?, Some(n.parse()?)),
            None => (port_tok.parse()?, None),
        };
        Ok(Self {
            kind: MediaKind::from(kind),
            port,
            num_ports,
            proto: proto.to_string(),
            fmts: p.map(str::to_string).collect(),
            title: None,
            connection: None,
            bandwidth: Vec::new(),
            attrs: Vec::new(),
            extra_lines: Vec::new(),
        })
    }
}

impl Media {
    /// Value of the first `a=<key>` attribute.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        find_value(&self.attrs, key)
    }

    #[must_use]
    pub fn control(&self) -> Option<&str> {
        self.attr("control")
    }

    /// The `a=rtpmap` entry for `pt`, falling back to the RFC 3551 static
    /// assignments a camera might use without an rtpmap.
    #[must_use]
    pub fn rtpmap(&self, pt: u8) -> Option<RtpMap> {
        self.attrs
            .iter()
            .filter(|a| a.key().eq_ignore_ascii_case("rtpmap"))
            .filter_map(|a| a.value()?.parse::<RtpMap>().ok())
            .find(|m| m.payload_type == pt)
            .or_else(|| static_rtpmap(pt))
    }

    /// `a=fmtp:<pt> k=v;k=v` as a map with lower-cased keys.
    #[must_use]
    pub fn fmtp(&self, pt: u8) -> HashMap<String, String> {
        let pt_tok = pt.to_string();
        self.attrs
            .iter()
            .filter(|a| a.key().eq_ignore_ascii_case("fmtp"))
            .filter_map(Attribute::value)
            .filter_map(|v| v.split_once(char::is_whitespace))
            .find(|(p, _)| *p == pt_tok)
            .map(|(_, params)| parse_fmtp_params(params))
            .unwrap_or_default()
    }

    /// First payload type on the `m=` line.
    #[must_use]
    pub fn payload_type(&self) -> Option<u8> {
        self.fmts.first().and_then(|f| f.parse().ok())
    }

    /// Encoding name of the first payload type, e.g. `H264`.
    #[must_use]
    pub fn codec_name(&self) -> Option<String> {
        self.rtpmap(self.payload_type()?).map(|m| m.encoding)
    }

    #[must_use]
    pub fn is_h264_video(&self) -> bool {
        self.kind == MediaKind::Video
            && self
                .codec_name()
                .is_some_and(|c| c.eq_ignore_ascii_case("H264"))
    }

    #[must_use]
    pub fn npt_range(&self) -> Option<NptRange> {
        self.attr("range").and_then(NptRange::parse)
    }
}

fn parse_fmtp_params(params: &str) -> HashMap<String, String> {
    params
        .split(';')
        .filter_map(|kv| {
            let kv = kv.trim();
            if kv.is_empty() {
                return None;
            }
            // Values such as base64 may contain '='; split on the first one only.
            let (k, v) = kv.split_once('=').unwrap_or((kv, ""));
            Some((k.trim().to_ascii_lowercase(), v.trim().to_string()))
        })
        .collect()
}

fn static_rtpmap(pt: u8) -> Option<RtpMap> {
    let (encoding, clock_rate, channels) = match pt {
        0 => ("PCMU", 8_000, Some(1)),
        8 => ("PCMA", 8_000, Some(1)),
        14 => ("MPA", 90_000, None),
        26 => ("JPEG", 90_000, None),
        32 => ("MPV", 90_000, None),
        33 => ("MP2T", 90_000, None),
        _ => return None,
    };
    Some(RtpMap {
        payload_type: pt,
        encoding: encoding.to_string(),
        clock_rate,
        channels,
    })
}
