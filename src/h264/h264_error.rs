use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum H264Error {
    /// Ran out of bits while reading a syntax element.
    EndOfData,
    /// An exp-Golomb code longer than 32 bits.
    ExpGolombOverflow,
    NotAnSps(u8),
    /// A field holds a value the standard forbids.
    OutOfRange(&'static str, u32),
    SpropBase64(String),
}

impl fmt::Display for H264Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use H264Error::*;
        match self {
            EndOfData => write!(f, "unexpected end of bitstream"),
            ExpGolombOverflow => write!(f, "exp-Golomb code too long"),
            NotAnSps(t) => write!(f, "NAL unit type {t} is not an SPS"),
            OutOfRange(field, v) => write!(f, "{field} out of range: {v}"),
            SpropBase64(e) => write!(f, "invalid sprop-parameter-sets: {e}"),
        }
    }
}

impl std::error::Error for H264Error {}
