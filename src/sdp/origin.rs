use std::str::FromStr;

use super::{addr_type::AddrType, sdp_error::SdpError};

/// The `o=` line: `<username> <sess-id> <sess-version> <nettype> <addrtype> <address>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    username: String,
    session_id: String,
    session_version: String,
    net_type: String,
    addr_type: AddrType,
    unicast_address: String,
}

impl Origin {
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Kept as text: cameras emit ids that overflow 64 bits.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn session_version(&self) -> &str {
        &self.session_version
    }

    #[must_use]
    pub fn net_type(&self) -> &str {
        &self.net_type
    }

    #[must_use]
    pub const fn addr_type(&self) -> AddrType {
        self.addr_type
    }

    #[must_use]
    pub fn unicast_address(&self) -> &str {
        &self.unicast_address
    }
}

impl FromStr for Origin {
    type Err = SdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [username, id, version, net_type, addr_type, address] = parts[..] else {
            return Err(SdpError::Invalid("o="));
        };
        Ok(Self {
            username: username.to_string(),
            session_id: id.to_string(),
            session_version: version.to_string(),
            net_type: net_type.to_string(),
            addr_type: addr_type.parse()?,
            unicast_address: address.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn parses_camera_origin() {
        let o: Origin = "- 1700000000123456789012 1 IN IP4 192.168.1.64"
            .parse()
            .unwrap();
        assert_eq!(o.username(), "-");
        assert_eq!(o.session_id(), "1700000000123456789012");
        assert_eq!(o.session_version(), "1");
        assert_eq!(o.addr_type(), AddrType::IP4);
        assert_eq!(o.unicast_address(), "192.168.1.64");
    }

    #[test]
    fn wrong_field_count_fails() {
        assert_eq!("- 1 1 IN IP4".parse::<Origin>(), Err(SdpError::Invalid("o=")));
    }
}
