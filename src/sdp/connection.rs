use std::str::FromStr;

use super::{addr_type::AddrType, sdp_error::SdpError};

/// A `c=<nettype> <addrtype> <address>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    net_type: String,
    addr_type: AddrType,
    /// Address, possibly with a multicast `/ttl` suffix.
    conn_address: String,
}

impl Connection {
    pub fn new(
        net_type: impl Into<String>,
        addr_type: AddrType,
        connection_address: impl Into<String>,
    ) -> Self {
        Self {
            net_type: net_type.into(),
            addr_type,
            conn_address: connection_address.into(),
        }
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
    pub fn connection_address(&self) -> &str {
        &self.conn_address
    }

    /// The address without any `/ttl` or `/count` suffix.
    #[must_use]
    pub fn host(&self) -> &str {
        self.conn_address
            .split('/')
            .next()
            .unwrap_or(&self.conn_address)
    }
}

impl FromStr for Connection {
    type Err = SdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(nt), Some(at), Some(addr)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(SdpError::Invalid("c="));
        };
        Ok(Self::new(nt, at.parse()?, addr))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn parses_multicast_with_ttl() {
        let c: Connection = "IN IP4 232.0.1.1/127".parse().unwrap();
        assert_eq!(c.net_type(), "IN");
        assert_eq!(c.addr_type(), AddrType::IP4);
        assert_eq!(c.connection_address(), "232.0.1.1/127");
        assert_eq!(c.host(), "232.0.1.1");
    }

    #[test]
    fn unknown_addr_type_fails() {
        assert_eq!(
            "IN IPX 1.2.3.4".parse::<Connection>(),
            Err(SdpError::AddrType("IPX".into()))
        );
        assert_eq!("IN IP4".parse::<Connection>(), Err(SdpError::Invalid("c=")));
    }
}
