use std::sync::Arc;

use openh264::formats::YUVSource;

use crate::{
    h264::{NalType, Sps, split_annexb},
    log::{LogSink, now_millis},
    media::{
        media_error::MediaError,
        video_frame::{ColorInfo, ColorMatrix, VideoFrame},
    },
    sink_debug, sink_info,
};

/// openh264 decoder plus the colour description read from in-band SPS.
pub struct H264Decoder {
    inner: openh264::decoder::Decoder,
    sps: Option<Sps>,
    frames_decoded: u64,
    logger: Arc<dyn LogSink>,
}

impl H264Decoder {
    /// # Errors
    /// `DecoderInit` when openh264 cannot be initialised.
    pub fn new(logger: Arc<dyn LogSink>) -> Result<Self, MediaError> {
        let inner = openh264::decoder::Decoder::new()
            .map_err(|e| MediaError::DecoderInit(format!("{e:?}")))?;
        Ok(Self {
            inner,
            sps: None,
            frames_decoded: 0,
            logger,
        })
    }

    #[must_use]
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    #[must_use]
    pub fn sps(&self) -> Option<&Sps> {
        self.sps.as_ref()
    }

    /// Decodes one Annex-B access unit into `out`, reusing its buffers.
    ///
    /// Returns `Ok(false)` when the decoder needs more data before it can
    /// output a picture.
    ///
    /// # Errors
    /// `Decode` when openh264 rejects the bitstream.
    pub fn decode(&mut self, au: &[u8], out: &mut VideoFrame) -> Result<bool, MediaError> {
        self.scan_parameter_sets(au);

        let decoded = self
            .inner
            .decode(au)
            .map_err(|e| MediaError::Decode(format!("{e:?}")))?;
        let Some(yuv) = decoded else {
            return Ok(false);
        };

        let (width, height) = yuv.dimensions();
        let (y_stride, u_stride, v_stride) = yuv.strides();
        let (cw, ch) = (width.div_ceil(2), height.div_ceil(2));

        out.width = width;
        out.height = height;
        out.y_stride = width;
        out.uv_stride = cw;
        copy_plane(yuv.y(), y_stride, width, height, &mut out.y);
        copy_plane(yuv.u(), u_stride, cw, ch, &mut out.u);
        copy_plane(yuv.v(), v_stride, cw, ch, &mut out.v);
        out.color = self.color_info();
        out.timestamp_ms = now_millis();

        self.frames_decoded += 1;
        if self.frames_decoded == 1 {
            self.log_stream_info(width, height);
        }
        Ok(true)
    }

    fn color_info(&self) -> ColorInfo {
        self.sps.as_ref().map_or_else(ColorInfo::default, |sps| ColorInfo {
            full_range: sps.full_range,
            matrix: if sps.is_bt709() {
                ColorMatrix::Bt709
            } else {
                ColorMatrix::Bt601
            },
        })
    }

    fn scan_parameter_sets(&mut self, au: &[u8]) {
        for nal in split_annexb(au) {
            if NalType::from_header(nal[0]) != NalType::Sps {
                continue;
            }
            match Sps::parse(nal) {
                Ok(sps) => self.sps = Some(sps),
                Err(e) => sink_debug!(self.logger, "[Decoder] unreadable SPS: {e}"),
            }
        }
    }

    fn log_stream_info(&self, width: usize, height: usize) {
        let color = self.color_info();
        let range = if color.full_range { "full" } else { "limited" };
        match &self.sps {
            Some(sps) => sink_info!(
                self.logger,
                "[Decoder] codec h264 ({} profile, level {}.{}), {}x{}, {} range, {}{}",
                sps.profile_name(),
                sps.level_idc / 10,
                sps.level_idc % 10,
                width,
                height,
                range,
                color.matrix,
                sps.fps.map(|f| format!(", {f:.2} fps")).unwrap_or_default()
            ),
            None => sink_info!(
                self.logger,
                "[Decoder] codec h264, {}x{}, {} range, {}",
                width,
                height,
                range,
                color.matrix
            ),
        }
    }
}

/// Copies `rows` rows of `row_len` bytes from a strided plane into a tight
/// buffer. Rows missing from `src` are left black.
fn copy_plane(src: &[u8], stride: usize, row_len: usize, rows: usize, dst: &mut Vec<u8>) {
    dst.clear();
    dst.resize(row_len * rows, 0);
    for (r, out) in dst.chunks_exact_mut(row_len.max(1)).enumerate().take(rows) {
        if let Some(row) = src.get(r * stride..r * stride + row_len) {
            out.copy_from_slice(row);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;

    #[test]
    fn copy_plane_drops_stride_padding() {
        let src = [1, 2, 9, 9, 3, 4, 9, 9];
        let mut dst = Vec::new();
        copy_plane(&src, 4, 2, 2, &mut dst);
        assert_eq!(dst, vec![1, 2, 3, 4]);
    }

    #[test]
    fn copy_plane_tolerates_short_source() {
        let src = [1, 2, 9, 9];
        let mut dst = vec![7; 10];
        copy_plane(&src, 4, 2, 2, &mut dst);
        assert_eq!(dst, vec![1, 2, 0, 0]);
    }

    #[test]
    fn parameter_sets_only_produce_no_picture() {
        let mut dec = H264Decoder::new(Arc::new(NoopLogSink)).unwrap();
        let mut au = vec![0, 0, 0, 1, 0x67, 0x42, 0x00, 0x1F, 0x95, 0xA8, 0x14, 0x01, 0x6E, 0x40];
        au.extend_from_slice(&[0, 0, 0, 1, 0x68, 0xCE, 0x3C, 0x80]);
        let mut frame = VideoFrame::default();
        let got = dec.decode(&au, &mut frame).unwrap_or(false);
        assert!(!got);
        assert_eq!(dec.sps().unwrap().width, 1280);
        assert_eq!(dec.frames_decoded(), 0);
    }
}
