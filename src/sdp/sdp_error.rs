use std::fmt;
use std::num::ParseIntError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdpError {
    Missing(&'static str),
    Invalid(&'static str),
    ParseInt(ParseIntError),
    AddrType(String),
}

impl From<ParseIntError> for SdpError {
    fn from(e: ParseIntError) -> Self {
        Self::ParseInt(e)
    }
}

impl fmt::Display for SdpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdpError::Missing(what) => write!(f, "Missing field: {what}"),
            SdpError::Invalid(what) => write!(f, "Invalid field: {what}"),
            SdpError::ParseInt(e) => write!(f, "Parse int error: {e}"),
            SdpError::AddrType(s) => write!(f, "Invalid address type: {s}"),
        }
    }
}

impl std::error::Error for SdpError {}
