use std::str::FromStr;

use super::sdp_error::SdpError;

/// An `a=` line: a property flag (`a=recvonly`) or a `key:value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    key: String,
    value: Option<String>,
}

impl Attribute {
    pub fn new<K: Into<String>, V: Into<Option<String>>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl FromStr for Attribute {
    type Err = SdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = match s.split_once(':') {
            Some((k, v)) => (k.trim(), Some(v.trim().to_string())),
            None => (s.trim(), None),
        };
        if key.is_empty() {
            return Err(SdpError::Invalid("a="));
        }
        Ok(Self::new(key, value))
    }
}

/// Finds the first attribute named `key` and returns its value.
pub(crate) fn find_value<'a>(attrs: &'a [Attribute], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.key().eq_ignore_ascii_case(key))
        .and_then(Attribute::value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn flag_and_value_forms() {
        let flag: Attribute = "recvonly".parse().unwrap();
        assert_eq!(flag.key(), "recvonly");
        assert_eq!(flag.value(), None);

        let kv: Attribute = "control:rtsp://cam/track1".parse().unwrap();
        assert_eq!(kv.key(), "control");
        assert_eq!(kv.value(), Some("rtsp://cam/track1"));
    }

    #[test]
    fn empty_key_is_invalid() {
        assert!(":x".parse::<Attribute>().is_err());
    }
}
