use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use super::{h264_error::H264Error, nal::START_CODE};

// Cameras are inconsistent about trailing '=' padding.
const SPROP_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes an `sprop-parameter-sets` fmtp value (comma-separated base64
/// NAL units, normally SPS then PPS) into Annex-B extradata.
///
/// A value that yields nothing but a lone start code becomes empty.
///
/// # Errors
/// `SpropBase64` when a record is not valid base64.
pub fn decode_sprop_parameter_sets(value: &str) -> Result<Vec<u8>, H264Error> {
    let mut out = Vec::new();
    for record in value.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        let nal = SPROP_BASE64
            .decode(record)
            .map_err(|e| H264Error::SpropBase64(e.to_string()))?;
        out.extend_from_slice(&START_CODE);
        out.extend_from_slice(&nal);
    }
    if out.len() == START_CODE.len() {
        out.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn sps_and_pps_become_annexb() {
        let out = decode_sprop_parameter_sets("Z0IAH5WoFAFuQA==,aM48gA==").unwrap();
        let mut expected = vec![0, 0, 0, 1, 0x67, 0x42, 0x00, 0x1F, 0x95, 0xA8, 0x14, 0x01, 0x6E, 0x40];
        expected.extend_from_slice(&[0, 0, 0, 1, 0x68, 0xCE, 0x3C, 0x80]);
        assert_eq!(out, expected);
    }

    #[test]
    fn missing_padding_is_accepted() {
        let padded = decode_sprop_parameter_sets("aM48gA==").unwrap();
        let bare = decode_sprop_parameter_sets("aM48gA").unwrap();
        assert_eq!(padded, bare);
    }

    #[test]
    fn empty_value_gives_empty_extradata() {
        assert!(decode_sprop_parameter_sets("").unwrap().is_empty());
        assert!(decode_sprop_parameter_sets(" , ").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            decode_sprop_parameter_sets("Z0IAH5WoFAFuQA==,@@@"),
            Err(H264Error::SpropBase64(_))
        ));
    }
}
