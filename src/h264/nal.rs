use std::fmt;

/// Four-byte Annex-B start code used for every NAL unit this crate emits.
pub const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// `nal_unit_type` values (ITU-T H.264 table 7-1) plus the RTP payload
/// structures of RFC 6184.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalType {
    Slice,
    SliceDpa,
    SliceDpb,
    SliceDpc,
    SliceIdr,
    Sei,
    Sps,
    Pps,
    Aud,
    EndOfSequence,
    EndOfStream,
    FillerData,
    StapA,
    StapB,
    Mtap16,
    Mtap24,
    FuA,
    FuB,
    Other(u8),
}

impl NalType {
    /// Type of a NAL unit from its header byte.
    #[must_use]
    pub fn from_header(header: u8) -> Self {
        Self::from(header & 0x1F)
    }

    #[must_use]
    pub fn is_vcl(self) -> bool {
        matches!(
            self,
            Self::Slice | Self::SliceDpa | Self::SliceDpb | Self::SliceDpc | Self::SliceIdr
        )
    }

    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::Slice => 1,
            Self::SliceDpa => 2,
            Self::SliceDpb => 3,
            Self::SliceDpc => 4,
            Self::SliceIdr => 5,
            Self::Sei => 6,
            Self::Sps => 7,
            Self::Pps => 8,
            Self::Aud => 9,
            Self::EndOfSequence => 10,
            Self::EndOfStream => 11,
            Self::FillerData => 12,
            Self::StapA => 24,
            Self::StapB => 25,
            Self::Mtap16 => 26,
            Self::Mtap24 => 27,
            Self::FuA => 28,
            Self::FuB => 29,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for NalType {
    fn from(id: u8) -> Self {
        match id {
            1 => Self::Slice,
            2 => Self::SliceDpa,
            3 => Self::SliceDpb,
            4 => Self::SliceDpc,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::Aud,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            24 => Self::StapA,
            25 => Self::StapB,
            26 => Self::Mtap16,
            27 => Self::Mtap24,
            28 => Self::FuA,
            29 => Self::FuB,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for NalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slice => write!(f, "slice"),
            Self::SliceDpa => write!(f, "slice DPA"),
            Self::SliceDpb => write!(f, "slice DPB"),
            Self::SliceDpc => write!(f, "slice DPC"),
            Self::SliceIdr => write!(f, "IDR slice"),
            Self::Sei => write!(f, "SEI"),
            Self::Sps => write!(f, "SPS"),
            Self::Pps => write!(f, "PPS"),
            Self::Aud => write!(f, "AUD"),
            Self::EndOfSequence => write!(f, "end of sequence"),
            Self::EndOfStream => write!(f, "end of stream"),
            Self::FillerData => write!(f, "filler"),
            Self::StapA => write!(f, "STAP-A"),
            Self::StapB => write!(f, "STAP-B"),
            Self::Mtap16 => write!(f, "MTAP16"),
            Self::Mtap24 => write!(f, "MTAP24"),
            Self::FuA => write!(f, "FU-A"),
            Self::FuB => write!(f, "FU-B"),
            Self::Other(id) => write!(f, "type {id}"),
        }
    }
}

/// Splits an Annex-B byte stream into NAL units (start codes removed).
///
/// Accepts 3- and 4-byte start codes. Bytes before the first start code
/// are ignored, as are trailing zero bytes of each unit.
pub fn split_annexb(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = match find_start_code(data) {
        Some((pos, len)) => &data[pos + len..],
        None => &data[data.len()..],
    };
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (unit, next) = match find_start_code(rest) {
            Some((pos, len)) => (&rest[..pos], &rest[pos + len..]),
            None => (rest, &rest[rest.len()..]),
        };
        rest = next;
        let end = unit.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
        Some(&unit[..end])
    })
    .filter(|u| !u.is_empty())
}

/// Position and length of the first `00 00 01` (optionally preceded by
/// one more zero).
fn find_start_code(data: &[u8]) -> Option<(usize, usize)> {
    let pos = data.windows(3).position(|w| w == [0, 0, 1])?;
    if pos > 0 && data[pos - 1] == 0 {
        Some((pos - 1, 4))
    } else {
        Some((pos, 3))
    }
}

/// Strips emulation-prevention bytes (`00 00 03` -> `00 00`), giving the RBSP.
#[must_use]
pub fn remove_emulation_prevention(nal: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(nal.len());
    let mut zeros = 0usize;
    for &b in nal {
        if zeros >= 2 && b == 3 {
            zeros = 0;
            continue;
        }
        zeros = if b == 0 { zeros + 1 } else { 0 };
        out.push(b);
    }
    out
}

/// Types of every NAL unit in an Annex-B buffer, in order.
pub fn nal_types(annexb: &[u8]) -> impl Iterator<Item = NalType> + '_ {
    split_annexb(annexb).map(|nal| NalType::from_header(nal[0]))
}
