use std::{fmt, str::FromStr};

use crate::rtsp::{auth::Credentials, rtsp_error::RtspError};

pub const DEFAULT_RTSP_PORT: u16 = 554;

/// `rtsp://[user[:password]@]host[:port][/path][?query]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspUrl {
    /// Host without IPv6 brackets.
    pub host: String,
    pub port: u16,
    explicit_port: bool,
    /// Path and query, empty or starting with `/`.
    pub path: String,
    pub credentials: Option<Credentials>,
}

impl RtspUrl {
    /// # Errors
    /// `InvalidUrl` for another scheme, an empty host or a bad port.
    pub fn parse(url: &str) -> Result<Self, RtspError> {
        let url = url.trim();
        let rest = strip_prefix_ignore_case(url, "rtsp://")
            .ok_or_else(|| RtspError::InvalidUrl(format!("'{url}' is not an rtsp:// URL")))?;

        let (authority, path) = match rest.find(['/', '?']) {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let path = if path.starts_with('?') {
            format!("/{path}")
        } else {
            path.to_string()
        };

        let (credentials, hostport) = match authority.rsplit_once('@') {
            Some((userinfo, hostport)) => {
                let (user, password) = userinfo.split_once(':').unwrap_or((userinfo, ""));
                let creds = Credentials::new(percent_decode(user), percent_decode(password));
                (Some(creds), hostport)
            }
            None => (None, authority),
        };

        let (host, port) = split_host_port(hostport)?;
        if host.is_empty() {
            return Err(RtspError::InvalidUrl(format!("'{url}' has no host")));
        }
        let explicit_port = port.is_some();
        Ok(Self {
            host: host.to_string(),
            port: port.unwrap_or(DEFAULT_RTSP_PORT),
            explicit_port,
            path,
            credentials,
        })
    }

    /// `host:port` suitable for `TcpStream::connect`.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host_for_url(), self.port)
    }

    /// The URL sent in request lines: credentials removed.
    #[must_use]
    pub fn request_url(&self) -> String {
        if self.explicit_port {
            format!("rtsp://{}:{}{}", self.host_for_url(), self.port, self.path)
        } else {
            format!("rtsp://{}{}", self.host_for_url(), self.path)
        }
    }

    fn host_for_url(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

impl FromStr for RtspUrl {
    type Err = RtspError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RtspUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.request_url())
    }
}

/// Resolves an `a=control` value against the presentation base URL.
#[must_use]
pub fn resolve_control(base: &str, control: &str) -> String {
    let control = control.trim();
    if control.is_empty() || control == "*" {
        return base.to_string();
    }
    if strip_prefix_ignore_case(control, "rtsp://").is_some()
        || strip_prefix_ignore_case(control, "rtsps://").is_some()
    {
        return control.to_string();
    }
    if control.starts_with('/') {
        let scheme_end = base.find("://").map_or(0, |i| i + 3);
        let authority_end = base[scheme_end..]
            .find('/')
            .map_or(base.len(), |i| scheme_end + i);
        return format!("{}{}", &base[..authority_end], control);
    }
    if base.ends_with('/') {
        format!("{base}{control}")
    } else {
        format!("{base}/{control}")
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn split_host_port(hostport: &str) -> Result<(&str, Option<u16>), RtspError> {
    let (host, port) = if let Some(v6) = hostport.strip_prefix('[') {
        let (host, after) = v6
            .split_once(']')
            .ok_or_else(|| RtspError::InvalidUrl(format!("unterminated IPv6 host '{hostport}'")))?;
        match after {
            "" => (host, None),
            p => (
                host,
                Some(p.strip_prefix(':').ok_or_else(|| {
                    RtspError::InvalidUrl(format!("unexpected '{p}' after IPv6 host"))
                })?),
            ),
        }
    } else {
        match hostport.split_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (hostport, None),
        }
    };

    let port = match port {
        None | Some("") => None,
        Some(p) => Some(
            p.parse::<u16>()
                .map_err(|_| RtspError::InvalidUrl(format!("bad port '{p}'")))?,
        ),
    };
    Ok((host, port))
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(v) = s.get(i + 1..i + 3).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
