//! H.264 bitstream helpers: RTP depacketization (RFC 6184), NAL unit
//! handling, out-of-band parameter sets and SPS inspection.
pub mod bit_reader;
pub mod depacketizer;
pub mod h264_error;
pub mod hex_line;
pub mod nal;
pub mod sprop;
pub mod sps;

pub use depacketizer::{AccessUnit, H264Depacketizer};
pub use h264_error::H264Error;
pub use hex_line::format_hex_line;
pub use nal::{NalType, START_CODE, split_annexb};
pub use sprop::decode_sprop_parameter_sets;
pub use sps::Sps;
