use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtcpError {
    TooShort,
    BadVersion(u8),
    Truncated,
    TooManyReportBlocks(usize),
    TooManyByeSources(usize),
    SdesItemTooLong,
    SdesItemTooShort,
}

impl fmt::Display for RtcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RtcpError::*;
        match self {
            TooShort => write!(f, "buffer too short"),
            BadVersion(v) => write!(f, "bad RTCP version: {v}"),
            Truncated => write!(f, "truncated RTCP structure"),
            TooManyReportBlocks(n) => write!(f, "{n} report blocks do not fit in 5 bits"),
            TooManyByeSources(n) => write!(f, "{n} BYE sources do not fit in 5 bits"),
            SdesItemTooLong => write!(f, "SDES item longer than 255 bytes"),
            SdesItemTooShort => write!(f, "SDES item too short"),
        }
    }
}

impl std::error::Error for RtcpError {}
