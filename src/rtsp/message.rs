//! RTSP/1.0 requests, responses and the interleaved-frame aware parser.

use std::{fmt, str::FromStr};

use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BytesMut};

use crate::rtsp::rtsp_error::RtspError;

/// Upper bound for a header block without its terminating blank line.
const MAX_HEAD_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Options,
    Describe,
    Setup,
    Play,
    Pause,
    GetParameter,
    SetParameter,
    Teardown,
    Announce,
    Record,
    Redirect,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Options => "OPTIONS",
            Method::Describe => "DESCRIBE",
            Method::Setup => "SETUP",
            Method::Play => "PLAY",
            Method::Pause => "PAUSE",
            Method::GetParameter => "GET_PARAMETER",
            Method::SetParameter => "SET_PARAMETER",
            Method::Teardown => "TEARDOWN",
            Method::Announce => "ANNOUNCE",
            Method::Record => "RECORD",
            Method::Redirect => "REDIRECT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RtspError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "OPTIONS" => Method::Options,
            "DESCRIBE" => Method::Describe,
            "SETUP" => Method::Setup,
            "PLAY" => Method::Play,
            "PAUSE" => Method::Pause,
            "GET_PARAMETER" => Method::GetParameter,
            "SET_PARAMETER" => Method::SetParameter,
            "TEARDOWN" => Method::Teardown,
            "ANNOUNCE" => Method::Announce,
            "RECORD" => Method::Record,
            "REDIRECT" => Method::Redirect,
            other => return Err(RtspError::Malformed(format!("unknown method '{other}'"))),
        })
    }
}

type Headers = Vec<(String, String)>;

fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspRequest {
    pub method: Method,
    pub uri: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RtspRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn cseq(&self) -> Option<u32> {
        self.header("CSeq").and_then(|v| v.trim().parse().ok())
    }

    /// Serialises the request; `Content-Length` is added for a body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!("{} {} RTSP/1.0\r\n", self.method, self.uri);
        for (k, v) in &self.headers {
            out.push_str(&format!("{k}: {v}\r\n"));
        }
        if !self.body.is_empty() {
            out.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        out.push_str("\r\n");
        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspResponse {
    pub code: u16,
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RtspResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Every value of a repeatable header, in order.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn cseq(&self) -> Option<u32> {
        self.header("CSeq").and_then(|v| v.trim().parse().ok())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One unit read from the control connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// `$` framed RTP/RTCP data.
    Interleaved { channel: u8, data: Vec<u8> },
    Response(RtspResponse),
    /// Server-initiated request (e.g. `ANNOUNCE`, `GET_PARAMETER`).
    Request(RtspRequest),
}

/// Takes one complete message off the front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed.
///
/// # Errors
/// `Malformed` for an unparsable start line or header block.
pub fn parse_incoming(buf: &mut BytesMut) -> Result<Option<Incoming>, RtspError> {
    let skip = buf.iter().take_while(|&&b| b == b'\r' || b == b'\n').count();
    buf.advance(skip);
    if buf.is_empty() {
        return Ok(None);
    }

    if buf[0] == b'$' {
        if buf.len() < 4 {
            return Ok(None);
        }
        let channel = buf[1];
        let len = usize::from(BigEndian::read_u16(&buf[2..4]));
        if buf.len() < 4 + len {
            return Ok(None);
        }
        buf.advance(4);
        let data = buf.split_to(len).to_vec();
        return Ok(Some(Incoming::Interleaved { channel, data }));
    }

    let Some((head_len, sep_len)) = find_head_end(buf) else {
        if buf.len() > MAX_HEAD_LEN {
            return Err(RtspError::Malformed("header block too large".into()));
        }
        return Ok(None);
    };

    let head = String::from_utf8_lossy(&buf[..head_len]).into_owned();
    let mut lines = head.lines();
    let start_line = lines.next().unwrap_or_default().trim().to_string();
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let (k, v) = line
            .split_once(':')
            .ok_or_else(|| RtspError::Malformed(format!("bad header line '{line}'")))?;
        headers.push((k.trim().to_string(), v.trim().to_string()));
    }

    let body_len = match find_header(&headers, "Content-Length") {
        Some(v) => v
            .trim()
            .parse::<usize>()
            .map_err(|_| RtspError::Malformed(format!("bad Content-Length '{v}'")))?,
        None => 0,
    };
    if buf.len() < head_len + sep_len + body_len {
        return Ok(None);
    }
    buf.advance(head_len + sep_len);
    let body = buf.split_to(body_len).to_vec();

    if let Some(status) = start_line.strip_prefix("RTSP/") {
        let mut parts = status.splitn(3, ' ');
        let _version = parts.next();
        let code = parts
            .next()
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or_else(|| RtspError::Malformed(format!("bad status line '{start_line}'")))?;
        let reason = parts.next().unwrap_or_default().to_string();
        return Ok(Some(Incoming::Response(RtspResponse {
            code,
            reason,
            headers,
            body,
        })));
    }

    let mut parts = start_line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(uri), Some(version)) if version.starts_with("RTSP/") => {
            Ok(Some(Incoming::Request(RtspRequest {
                method: method.parse()?,
                uri: uri.to_string(),
                headers,
                body,
            })))
        }
        _ => Err(RtspError::Malformed(format!("bad start line '{start_line}'"))),
    }
}

/// Length of the header block and of its terminating blank line.
fn find_head_end(buf: &[u8]) -> Option<(usize, usize)> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn buf(s: &[u8]) -> BytesMut {
        BytesMut::from(s)
    }

    #[test]
    fn request_encoding() {
        let req = RtspRequest::new(Method::Describe, "rtsp://cam/live")
            .with_header("CSeq", "2")
            .with_header("Accept", "application/sdp");
        assert_eq!(
            String::from_utf8(req.encode()).unwrap(),
            "DESCRIBE rtsp://cam/live RTSP/1.0\r\nCSeq: 2\r\nAccept: application/sdp\r\n\r\n"
        );
        assert_eq!(req.cseq(), Some(2));
    }

    #[test]
    fn response_with_body_waits_for_all_bytes() {
        let full = b"RTSP/1.0 200 OK\r\nCSeq: 3\r\ncontent-length: 5\r\n\r\nv=0\r\n";
        let mut b = buf(&full[..full.len() - 2]);
        assert!(parse_incoming(&mut b).unwrap().is_none());
        b.extend_from_slice(&full[full.len() - 2..]);
        let Some(Incoming::Response(r)) = parse_incoming(&mut b).unwrap() else {
            panic!("expected response");
        };
        assert_eq!(r.code, 200);
        assert_eq!(r.reason, "OK");
        assert_eq!(r.cseq(), Some(3));
        assert_eq!(r.header("Content-Length"), Some("5"));
        assert_eq!(r.body_text(), "v=0\r\n");
        assert!(b.is_empty());
    }

    #[test]
    fn interleaved_frames_between_responses() {
        let mut b = buf(b"$\x01\x00\x03abcRTSP/1.0 404 Not Found\r\nCSeq: 9\r\n\r\n$\x00\x00");
        assert_eq!(
            parse_incoming(&mut b).unwrap(),
            Some(Incoming::Interleaved {
                channel: 1,
                data: b"abc".to_vec()
            })
        );
        let Some(Incoming::Response(r)) = parse_incoming(&mut b).unwrap() else {
            panic!("expected response");
        };
        assert_eq!((r.code, r.reason.as_str()), (404, "Not Found"));
        assert!(!r.is_success());
        assert!(parse_incoming(&mut b).unwrap().is_none());
        assert_eq!(&b[..], b"$\x00\x00");
    }

    #[test]
    fn server_request_and_repeated_headers() {
        let mut b = buf(
            b"\r\nANNOUNCE rtsp://cam/ RTSP/1.0\r\nCSeq: 1\r\n\r\nRTSP/1.0 401 Unauthorized\n\
              WWW-Authenticate: Basic realm=\"a\"\nWWW-Authenticate: Digest realm=\"a\", nonce=\"n\"\n\n",
        );
        let Some(Incoming::Request(req)) = parse_incoming(&mut b).unwrap() else {
            panic!("expected request");
        };
        assert_eq!(req.method, Method::Announce);
        let Some(Incoming::Response(r)) = parse_incoming(&mut b).unwrap() else {
            panic!("expected response");
        };
        assert_eq!(r.header_values("www-authenticate").count(), 2);
    }

    #[test]
    fn garbage_is_rejected() {
        let mut b = buf(b"HELLO\r\n\r\n");
        assert!(parse_incoming(&mut b).is_err());
        let mut b = buf(b"RTSP/1.0 abc OK\r\n\r\n");
        assert!(parse_incoming(&mut b).is_err());
        assert!("FETCH".parse::<Method>().is_err());
    }
}
