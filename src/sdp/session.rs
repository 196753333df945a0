use std::str::FromStr;

use super::{
    attribute::{Attribute, find_value},
    bandwidth::Bandwidth,
    connection::Connection,
    media::Media,
    origin::Origin,
    sdp_error::SdpError,
    time_desc::TimeDesc,
};

/// A parsed session description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sdp {
    pub version: u8,
    pub origin: Origin,
    pub session_name: String,
    pub session_info: Option<String>,
    pub uri: Option<String>,
    pub connection: Option<Connection>,
    pub bandwidth: Vec<Bandwidth>,
    pub times: Vec<TimeDesc>,
    pub attrs: Vec<Attribute>,
    pub media: Vec<Media>,
    /// Lines with a type this parser does not model (`e=`, `p=`, `k=`...).
    pub extra_lines: Vec<String>,
}

impl Sdp {
    /// Parses a description. `v=`, `o=` and `s=` are required; an empty
    /// `s=` is accepted since many cameras send one.
    ///
    /// # Errors
    /// A missing mandatory line or a malformed known line.
    pub fn parse(input: &str) -> Result<Self, SdpError> {
        let mut version: Option<u8> = None;
        let mut origin: Option<Origin> = None;
        let mut session_name: Option<String> = None;
        let mut session_info = None;
        let mut uri = None;
        let mut connection = None;
        let mut bandwidth = Vec::new();
        let mut times: Vec<TimeDesc> = Vec::new();
        let mut attrs = Vec::new();
        let mut media: Vec<Media> = Vec::new();
        let mut extra_lines = Vec::new();

        for raw in input.lines() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let Some((prefix, rest)) = line.split_once('=') else {
                extra_lines.push(line.to_string());
                continue;
            };
            let prefix = prefix.trim();
            if prefix == "m" {
                media.push(rest.parse()?);
                continue;
            }
            match (prefix, media.last_mut()) {
                ("v", _) => version = Some(rest.trim().parse()?),
                ("o", _) => origin = Some(rest.parse()?),
                ("s", _) => session_name = Some(rest.to_string()),
                ("u", _) => uri = Some(rest.to_string()),
                ("t", _) => {
                    let mut p = rest.split_whitespace();
                    let (Some(st), Some(et)) = (p.next(), p.next()) else {
                        return Err(SdpError::Invalid("t="));
                    };
                    times.push(TimeDesc::new(st.parse()?, et.parse()?));
                }
                ("r", _) => times
                    .last_mut()
                    .ok_or(SdpError::Invalid("r= without t="))?
                    .repeats
                    .push(rest.to_string()),
                ("z", _) => {
                    times
                        .last_mut()
                        .ok_or(SdpError::Invalid("z= without t="))?
                        .zone = Some(rest.to_string());
                }
                ("i", Some(m)) => m.title = Some(rest.to_string()),
                ("i", None) => session_info = Some(rest.to_string()),
                ("c", Some(m)) => m.connection = Some(rest.parse()?),
                ("c", None) => connection = Some(rest.parse()?),
                ("b", Some(m)) => m.bandwidth.push(rest.parse()?),
                ("b", None) => bandwidth.push(rest.parse()?),
                ("a", Some(m)) => m.attrs.push(rest.parse()?),
                ("a", None) => attrs.push(rest.parse()?),
                (_, Some(m)) => m.extra_lines.push(line.to_string()),
                (_, None) => extra_lines.push(line.to_string()),
            }
        }

        Ok(Self {
            version: version.ok_or(SdpError::Missing("v="))?,
            origin: origin.ok_or(SdpError::Missing("o="))?,
            session_name: session_name.ok_or(SdpError::Missing("s="))?,
            session_info,
            uri,
            connection,
            bandwidth,
            times,
            attrs,
            media,
            extra_lines,
        })
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        find_value(&self.attrs, key)
    }

    /// Session-level `a=control`, the aggregate control URL.
    #[must_use]
    pub fn control(&self) -> Option<&str> {
        self.attr("control")
    }

    /// Session-level `a=range`, falling back to the media sections: the
    /// earliest start and, when every bounded section agrees on being
    /// bounded, the latest end.
    #[must_use]
    pub fn npt_range(&self) -> Option<NptRange> {
        if let Some(r) = self.attr("range").and_then(NptRange::parse) {
            return Some(r);
        }
        self.media
            .iter()
            .filter_map(Media::npt_range)
            .reduce(|a, b| NptRange {
                start: a.start.min(b.start),
                end: match (a.end, b.end) {
                    (Some(x), Some(y)) => Some(x.max(y)),
                    _ => None,
                },
            })
    }
}

impl FromStr for Sdp {
    type Err = SdpError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `a=range:npt=<start>-[<end>]` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NptRange {
    pub start: f64,
    /// `None` for live streams (`npt=0-`).
    pub end: Option<f64>,
}

impl NptRange {
    /// Parses the attribute value. Non-npt ranges (`clock=`, `smpte=`)
    /// yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let spec = value.trim().strip_prefix("npt")?.trim_start();
        let spec = spec.strip_prefix('=').or_else(|| spec.strip_prefix(':'))?;
        let (start, end) = spec.split_once('-')?;
        let start = match start.trim() {
            "" | "now" => 0.0,
            s => parse_npt_time(s)?,
        };
        let end = match end.trim() {
            "" => None,
            e => Some(parse_npt_time(e)?),
        };
        Some(Self { start, end })
    }

    /// Play length when the end is known.
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        self.end.map(|e| (e - self.start).max(0.0))
    }
}

/// `12.5` or `h:mm:ss.frac`. Negative or non-finite values are rejected.
fn parse_npt_time(s: &str) -> Option<f64> {
    let mut total = 0.0;
    for part in s.split(':') {
        let v = part.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)?;
        total = total * 60.0 + v;
    }
    total.is_finite().then_some(total)
}
