//! `Basic` and `Digest` (RFC 2617, MD5) client authentication.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};
use rand::Rng;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic {
        realm: String,
    },
    Digest {
        realm: String,
        nonce: String,
        opaque: Option<String>,
        /// `qop=auth` was offered.
        qop_auth: bool,
    },
}

impl Challenge {
    /// Parses one `WWW-Authenticate` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (scheme, params) = value.split_once(' ').unwrap_or((value, ""));
        let params = parse_params(params);
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(k))
                .map(|(_, v)| v.clone())
        };

        if scheme.eq_ignore_ascii_case("basic") {
            return Some(Challenge::Basic {
                realm: get("realm").unwrap_or_default(),
            });
        }
        if !scheme.eq_ignore_ascii_case("digest") {
            return None;
        }
        if get("algorithm").is_some_and(|a| !a.eq_ignore_ascii_case("md5")) {
            return None;
        }
        Some(Challenge::Digest {
            realm: get("realm").unwrap_or_default(),
            nonce: get("nonce")?,
            opaque: get("opaque"),
            qop_auth: get("qop").is_some_and(|q| {
                q.split(',').any(|o| o.trim().eq_ignore_ascii_case("auth"))
            }),
        })
    }
}

/// Builds `Authorization` values for every request after a 401.
#[derive(Debug, Clone)]
pub struct Authenticator {
    creds: Credentials,
    challenge: Challenge,
    nonce_count: u32,
}

impl Authenticator {
    /// Picks a scheme from the offered challenges; Digest wins over Basic.
    pub fn from_challenges<'a>(
        creds: Credentials,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let challenges: Vec<Challenge> = values.into_iter().filter_map(Challenge::parse).collect();
        let challenge = challenges
            .iter()
            .find(|c| matches!(c, Challenge::Digest { .. }))
            .or_else(|| challenges.first())?
            .clone();
        Some(Self {
            creds,
            challenge,
            nonce_count: 0,
        })
    }

    #[must_use]
    pub fn scheme(&self) -> &'static str {
        match self.challenge {
            Challenge::Basic { .. } => "Basic",
            Challenge::Digest { .. } => "Digest",
        }
    }

    pub fn authorization(&mut self, method: &str, uri: &str) -> String {
        match &self.challenge {
            Challenge::Basic { .. } => {
                let token = STANDARD.encode(format!("{}:{}", self.creds.user, self.creds.password));
                format!("Basic {token}")
            }
            Challenge::Digest {
                realm,
                nonce,
                opaque,
                qop_auth,
            } => {
                let mut header = format!(
                    "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\"",
                    self.creds.user, realm, nonce, uri
                );
                if *qop_auth {
                    self.nonce_count = self.nonce_count.wrapping_add(1);
                    let nc = format!("{:08x}", self.nonce_count);
                    let cnonce = format!("{:016x}", rand::thread_rng().r#gen::<u64>());
                    let response = digest_response(
                        &self.creds,
                        realm,
                        nonce,
                        method,
                        uri,
                        Some((&nc, &cnonce)),
                    );
                    header.push_str(&format!(
                        ", response=\"{response}\", qop=auth, nc={nc}, cnonce=\"{cnonce}\""
                    ));
                } else {
                    let response = digest_response(&self.creds, realm, nonce, method, uri, None);
                    header.push_str(&format!(", response=\"{response}\""));
                }
                if let Some(opaque) = opaque {
                    header.push_str(&format!(", opaque=\"{opaque}\""));
                }
                header
            }
        }
    }
}

/// RFC 2617 request-digest. `qop` carries `(nc, cnonce)` for `qop=auth`.
#[must_use]
pub fn digest_response(
    creds: &Credentials,
    realm: &str,
    nonce: &str,
    method: &str,
    uri: &str,
    qop: Option<(&str, &str)>,
) -> String {
    let ha1 = md5_hex(&format!("{}:{}:{}", creds.user, realm, creds.password));
    let ha2 = md5_hex(&format!("{method}:{uri}"));
    match qop {
        Some((nc, cnonce)) => md5_hex(&format!("{ha1}:{nonce}:{nc}:{cnonce}:auth:{ha2}")),
        None => md5_hex(&format!("{ha1}:{nonce}:{ha2}")),
    }
}

fn md5_hex(s: &str) -> String {
    Md5::digest(s.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// `k1="v, 1", k2=v2` into pairs; quotes removed.
fn parse_params(s: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    for c in s.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                cur.push(c);
            }
            ',' if !quoted => parts.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    parts.push(cur);

    for part in parts {
        if let Some((k, v)) = part.split_once('=') {
            let v = v.trim();
            let v = v
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(v);
            out.push((k.trim().to_string(), v.to_string()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn basic_header() {
        let mut a = Authenticator::from_challenges(
            Credentials::new("Aladdin", "open sesame"),
            ["Basic realm=\"cam\""],
        )
        .unwrap();
        assert_eq!(a.scheme(), "Basic");
        assert_eq!(
            a.authorization("DESCRIBE", "rtsp://cam/"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn rfc2617_digest_example() {
        let creds = Credentials::new("Mufasa", "Circle Of Life");
        let r = digest_response(
            &creds,
            "testrealm@host.com",
            "dcd98b7102dd2f0e8b11d0f600bfb0c093",
            "GET",
            "/dir/index.html",
            Some(("00000001", "0a4f113b")),
        );
        assert_eq!(r, "6629fae49393a05397450978507c4ef1");
    }

    #[test]
    fn digest_is_preferred_and_formatted() {
        let mut a = Authenticator::from_challenges(
            Credentials::new("admin", "12345"),
            [
                "Basic realm=\"IP Camera\"",
                "Digest realm=\"IP Camera\", nonce=\"abc, def\", opaque=\"xyz\"",
            ],
        )
        .unwrap();
        assert_eq!(a.scheme(), "Digest");
        let h = a.authorization("DESCRIBE", "rtsp://cam/live");
        let expected = digest_response(
            &Credentials::new("admin", "12345"),
            "IP Camera",
            "abc, def",
            "DESCRIBE",
            "rtsp://cam/live",
            None,
        );
        assert!(h.starts_with("Digest username=\"admin\", realm=\"IP Camera\", nonce=\"abc, def\""));
        assert!(h.contains(&format!("response=\"{expected}\"")));
        assert!(h.ends_with("opaque=\"xyz\""));
    }

    #[test]
    fn qop_auth_counts_nonces() {
        let mut a = Authenticator::from_challenges(
            Credentials::new("u", "p"),
            ["Digest realm=\"r\", nonce=\"n\", qop=\"auth,auth-int\""],
        )
        .unwrap();
        assert!(a.authorization("PLAY", "rtsp://h/").contains("nc=00000001"));
        assert!(a.authorization("PLAY", "rtsp://h/").contains("nc=00000002"));
    }

    #[test]
    fn unknown_schemes_are_ignored() {
        assert!(Authenticator::from_challenges(Credentials::new("u", "p"), ["Bearer x"]).is_none());
        assert!(Challenge::parse("Digest realm=\"r\", nonce=\"n\", algorithm=SHA-256").is_none());
        assert!(format!("{:?}", Credentials::new("u", "secret")).contains("***"));
    }
}
