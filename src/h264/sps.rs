//! Sequence parameter set inspection (ITU-T H.264 §7.3.2.1.1 and annex E).
//!
//! Only what the pipeline needs is kept: stream geometry, profile and level
//! for logging, and the VUI colour description that selects the YUV to RGB
//! conversion.
use super::{
    bit_reader::BitReader,
    h264_error::H264Error,
    nal::{NalType, remove_emulation_prevention},
};

/// Upper bound for either picture dimension, well above level 6.2.
const MAX_SIZE_IN_MBS: u32 = 2048;

#[derive(Debug, Clone, PartialEq)]
pub struct Sps {
    pub profile_idc: u8,
    pub constraint_set_flags: u8,
    pub level_idc: u8,
    pub sps_id: u32,
    pub chroma_format_idc: u32,
    pub bit_depth_luma: u32,
    /// Width in pixels after cropping.
    pub width: u32,
    /// Height in pixels after cropping.
    pub height: u32,
    pub frame_mbs_only: bool,
    /// `video_full_range_flag`; false when the VUI does not carry it.
    pub full_range: bool,
    pub colour_primaries: Option<u8>,
    pub transfer_characteristics: Option<u8>,
    pub matrix_coefficients: Option<u8>,
    /// Frames per second from VUI timing info.
    pub fps: Option<f64>,
}

impl Sps {
    /// Parses an SPS NAL unit (header byte included, no start code).
    ///
    /// A truncated or malformed VUI is tolerated and treated as absent.
    ///
    /// # Errors
    /// The NAL is not an SPS or the mandatory part is malformed.
    pub fn parse(nal: &[u8]) -> Result<Self, H264Error> {
        let header = *nal.first().ok_or(H264Error::EndOfData)?;
        if NalType::from_header(header) != NalType::Sps {
            return Err(H264Error::NotAnSps(header & 0x1F));
        }
        let rbsp = remove_emulation_prevention(&nal[1..]);
        let mut br = BitReader::new(&rbsp);

        let profile_idc = read_u8(&mut br)?;
        let constraint_set_flags = read_u8(&mut br)?;
        let level_idc = read_u8(&mut br)?;
        let sps_id = br.read_ue()?;
        if sps_id > 31 {
            return Err(H264Error::OutOfRange("seq_parameter_set_id", sps_id));
        }

        let mut chroma_format_idc = 1;
        let mut separate_colour_plane = false;
        let mut bit_depth_luma = 8;
        if is_high_profile(profile_idc) {
            chroma_format_idc = br.read_ue()?;
            if chroma_format_idc > 3 {
                return Err(H264Error::OutOfRange("chroma_format_idc", chroma_format_idc));
            }
            if chroma_format_idc == 3 {
                separate_colour_plane = br.read_bit()?;
            }
            let bit_depth_luma_minus8 = br.read_ue()?;
            if bit_depth_luma_minus8 > 6 {
                return Err(H264Error::OutOfRange("bit_depth_luma_minus8", bit_depth_luma_minus8));
            }
            bit_depth_luma = bit_depth_luma_minus8 + 8;
            let _bit_depth_chroma = br.read_ue()?;
            let _qpprime_y_zero_transform_bypass = br.read_bit()?;
            if br.read_bit()? {
                let lists = if chroma_format_idc == 3 { 12 } else { 8 };
                for i in 0..lists {
                    if br.read_bit()? {
                        skip_scaling_list(&mut br, if i < 6 { 16 } else { 64 })?;
                    }
                }
            }
        }

        let _log2_max_frame_num_minus4 = br.read_ue()?;
        match br.read_ue()? {
            0 => {
                let _log2_max_poc_lsb_minus4 = br.read_ue()?;
            }
            1 => {
                let _delta_pic_order_always_zero = br.read_bit()?;
                let _offset_for_non_ref_pic = br.read_se()?;
                let _offset_for_top_to_bottom_field = br.read_se()?;
                let cycle = br.read_ue()?;
                if cycle > 255 {
                    return Err(H264Error::OutOfRange(
                        "num_ref_frames_in_pic_order_cnt_cycle",
                        cycle,
                    ));
                }
                for _ in 0..cycle {
                    br.read_se()?;
                }
            }
            2 => {}
            other => return Err(H264Error::OutOfRange("pic_order_cnt_type", other)),
        }

        let _max_num_ref_frames = br.read_ue()?;
        let _gaps_in_frame_num_allowed = br.read_bit()?;
        let width_mbs = read_size_in_mbs(&mut br, "pic_width_in_mbs_minus1")?;
        let height_map_units = read_size_in_mbs(&mut br, "pic_height_in_map_units_minus1")?;
        let frame_mbs_only = br.read_bit()?;
        if !frame_mbs_only {
            let _mb_adaptive_frame_field = br.read_bit()?;
        }
        let _direct_8x8_inference = br.read_bit()?;

        let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0, 0, 0, 0);
        if br.read_bit()? {
            crop_left = br.read_ue()?;
            crop_right = br.read_ue()?;
            crop_top = br.read_ue()?;
            crop_bottom = br.read_ue()?;
        }

        let field_factor = if frame_mbs_only { 1 } else { 2 };
        let chroma_array_type = if separate_colour_plane {
            0
        } else {
            chroma_format_idc
        };
        let (crop_unit_x, crop_unit_y) = match chroma_array_type {
            0 => (1, field_factor),
            1 => (2, 2 * field_factor),
            2 => (2, field_factor),
            _ => (1, field_factor),
        };
        let full_width = width_mbs * 16;
        let full_height = height_map_units * 16 * field_factor;
        let crop_x = crop_left.saturating_add(crop_right).saturating_mul(crop_unit_x);
        let crop_y = crop_top.saturating_add(crop_bottom).saturating_mul(crop_unit_y);
        if crop_x >= full_width {
            return Err(H264Error::OutOfRange("frame_crop_left/right_offset", crop_x));
        }
        if crop_y >= full_height {
            return Err(H264Error::OutOfRange("frame_crop_top/bottom_offset", crop_y));
        }
        let width = full_width - crop_x;
        let height = full_height - crop_y;

        let mut sps = Self {
            profile_idc,
            constraint_set_flags,
            level_idc,
            sps_id,
            chroma_format_idc,
            bit_depth_luma,
            width,
            height,
            frame_mbs_only,
            full_range: false,
            colour_primaries: None,
            transfer_characteristics: None,
            matrix_coefficients: None,
            fps: None,
        };

        if br.read_bit().unwrap_or(false) {
            // Keep whatever VUI fields were read before a truncation.
            let _ = sps.parse_vui(&mut br);
        }
        Ok(sps)
    }

    fn parse_vui(&mut self, br: &mut BitReader<'_>) -> Result<(), H264Error> {
        if br.read_bit()? {
            let aspect_ratio_idc = br.read_bits(8)?;
            if aspect_ratio_idc == 255 {
                br.skip_bits(32)?;
            }
        }
        if br.read_bit()? {
            let _overscan_appropriate = br.read_bit()?;
        }
        if br.read_bit()? {
            let _video_format = br.read_bits(3)?;
            self.full_range = br.read_bit()?;
            if br.read_bit()? {
                self.colour_primaries = Some(read_u8(br)?);
                self.transfer_characteristics = Some(read_u8(br)?);
                self.matrix_coefficients = Some(read_u8(br)?);
            }
        }
        if br.read_bit()? {
            let _top = br.read_ue()?;
            let _bottom = br.read_ue()?;
        }
        if br.read_bit()? {
            let num_units_in_tick = br.read_bits(32)?;
            let time_scale = br.read_bits(32)?;
            if num_units_in_tick > 0 {
                self.fps = Some(f64::from(time_scale) / (2.0 * f64::from(num_units_in_tick)));
            }
        }
        Ok(())
    }

    /// Profile name for log lines.
    #[must_use]
    pub fn profile_name(&self) -> &'static str {
        match self.profile_idc {
            66 if self.constraint_set_flags & 0x40 != 0 => "Constrained Baseline",
            66 => "Baseline",
            77 => "Main",
            88 => "Extended",
            100 => "High",
            110 => "High 10",
            122 => "High 4:2:2",
            244 => "High 4:4:4 Predictive",
            44 => "CAVLC 4:4:4 Intra",
            _ => "Unknown",
        }
    }

    /// True when the VUI signals BT.709 matrix coefficients.
    #[must_use]
    pub fn is_bt709(&self) -> bool {
        self.matrix_coefficients == Some(1)
    }
}

/// Reads a `*_minus1` size field and returns the size in macroblocks.
fn read_size_in_mbs(br: &mut BitReader<'_>, field: &'static str) -> Result<u32, H264Error> {
    let minus1 = br.read_ue()?;
    if minus1 >= MAX_SIZE_IN_MBS {
        return Err(H264Error::OutOfRange(field, minus1));
    }
    Ok(minus1 + 1)
}

fn read_u8(br: &mut BitReader<'_>) -> Result<u8, H264Error> {
    u8::try_from(br.read_bits(8)?).map_err(|_| H264Error::EndOfData)
}

fn is_high_profile(profile_idc: u8) -> bool {
    matches!(
        profile_idc,
        100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 138 | 139 | 134 | 135
    )
}

fn skip_scaling_list(br: &mut BitReader<'_>, size: usize) -> Result<(), H264Error> {
    let mut last = 8i32;
    let mut next = 8i32;
    for _ in 0..size {
        if next != 0 {
            let delta = br.read_se()?;
            next = last.wrapping_add(delta).rem_euclid(256);
        }
        if next != 0 {
            last = next;
        }
    }
    Ok(())
}
