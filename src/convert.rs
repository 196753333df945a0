//! Rebuilds a binary stream from `"<label> | <hex>"` log lines.
//!
//! The payload is the field after the first `" | "` of a line, up to the next
//! separator if there is one. Hex digits of all lines are concatenated before
//! decoding, so a byte may straddle two lines.

use std::{fmt, fs, io, path::Path};

const SEPARATOR: &str = " | ";

#[derive(Debug)]
pub enum ConvertError {
    Io(io::Error),
    MissingSeparator { line: usize },
    InvalidHex { line: usize, ch: char },
    /// Total digit count is odd.
    OddLength,
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConvertError::*;
        match self {
            Io(e) => write!(f, "Io error: {e}"),
            MissingSeparator { line } => write!(f, "line {line}: no '{}' separator", SEPARATOR),
            InvalidHex { line, ch } => write!(f, "line {line}: invalid hex digit {ch:?}"),
            OddLength => write!(f, "odd number of hex digits"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConvertError {
    fn from(e: io::Error) -> Self {
        ConvertError::Io(e)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexLog {
    pub data: Vec<u8>,
    /// Lines that contributed bytes.
    pub lines: usize,
    /// Lines ignored in lenient mode.
    pub skipped: usize,
}

/// Decodes a hex log. In lenient mode lines without a separator or with
/// non-hex payloads are skipped instead of failing.
///
/// # Errors
/// `MissingSeparator` or `InvalidHex` (strict mode only), `OddLength`.
pub fn parse_hex_log(text: &str, lenient: bool) -> Result<HexLog, ConvertError> {
    let mut digits: Vec<u8> = Vec::new();
    let mut out = HexLog::default();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let Some(payload) = raw.split(SEPARATOR).nth(1) else {
            if lenient {
                out.skipped += 1;
                continue;
            }
            return Err(ConvertError::MissingSeparator { line: line_no });
        };

        let start = digits.len();
        let mut bad = None;
        for ch in payload.chars().filter(|c| !c.is_whitespace()) {
            match ch.to_digit(16) {
                Some(d) => digits.push(d as u8),
                None => {
                    bad = Some(ch);
                    break;
                }
            }
        }
        if let Some(ch) = bad {
            if lenient {
                digits.truncate(start);
                out.skipped += 1;
                continue;
            }
            return Err(ConvertError::InvalidHex { line: line_no, ch });
        }
        out.lines += 1;
    }

    if digits.len() % 2 != 0 {
        return Err(ConvertError::OddLength);
    }
    out.data = digits.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect();
    Ok(out)
}

/// Converts the hex log at `input` into the binary file `output`.
///
/// # Errors
/// I/O failures and the errors of [`parse_hex_log`].
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    lenient: bool,
) -> Result<HexLog, ConvertError> {
    let text = fs::read_to_string(input)?;
    let log = parse_hex_log(&text, lenient)?;
    fs::write(output, &log.data)?;
    Ok(log)
}
