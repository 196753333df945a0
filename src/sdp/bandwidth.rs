use std::{fmt, str::FromStr};

use super::sdp_error::SdpError;

/// A `b=<bwtype>:<kbps>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bandwidth {
    bwtype: String,
    bandwidth: u64,
}

impl Bandwidth {
    pub fn new(bwtype: impl Into<String>, bandwidth: u64) -> Self {
        Self {
            bwtype: bwtype.into(),
            bandwidth,
        }
    }

    #[must_use]
    pub fn bwtype(&self) -> &str {
        &self.bwtype
    }

    #[must_use]
    pub const fn bandwidth(&self) -> u64 {
        self.bandwidth
    }
}

impl FromStr for Bandwidth {
    type Err = SdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (typ, val) = s.split_once(':').ok_or(SdpError::Invalid("b="))?;
        Ok(Self::new(typ.trim(), val.trim().parse::<u64>()?))
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bwtype, self.bandwidth)
    }
}
