//! YUV 4:2:0 to packed RGB24/BGR24 with bilinear resampling.
//!
//! Sample positions are centre aligned. Interpolation taps for every output
//! row and column are computed once, when the scaler is built from the first
//! frame.

use crate::media::{
    image::ImageFormat,
    media_error::MediaError,
    video_frame::{ColorInfo, ColorMatrix, VideoFrame},
};

#[derive(Debug, Clone, Copy)]
struct Tap {
    i0: usize,
    i1: usize,
    /// Weight of `i1`.
    w: f32,
}

#[derive(Debug, Clone, Copy)]
struct Coeffs {
    y_offset: f32,
    y_scale: f32,
    c_scale: f32,
    rv: f32,
    gu: f32,
    gv: f32,
    bu: f32,
}

impl Coeffs {
    fn new(color: ColorInfo) -> Self {
        let (rv, gu, gv, bu) = match color.matrix {
            ColorMatrix::Bt601 => (1.402, 0.344_136, 0.714_136, 1.772),
            ColorMatrix::Bt709 => (1.574_8, 0.187_33, 0.468_13, 1.855_63),
        };
        let (y_offset, y_scale, c_scale) = if color.full_range {
            (0.0, 1.0, 1.0)
        } else {
            (16.0, 255.0 / 219.0, 255.0 / 224.0)
        };
        Self {
            y_offset,
            y_scale,
            c_scale,
            rv,
            gu,
            gv,
            bu,
        }
    }

    #[inline]
    fn to_rgb(&self, y: f32, u: f32, v: f32) -> [u8; 3] {
        let y = ((y - self.y_offset) * self.y_scale).max(0.0);
        let u = (u - 128.0) * self.c_scale;
        let v = (v - 128.0) * self.c_scale;
        [
            clamp(y + self.rv * v),
            clamp(y - self.gu * u - self.gv * v),
            clamp(y + self.bu * u),
        ]
    }
}

#[inline]
fn clamp(v: f32) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}

/// Taps mapping `dst` output positions onto a plane of `src_len` samples,
/// with `step` source samples per output sample.
fn taps(src_len: usize, step: f64, dst: usize) -> Vec<Tap> {
    let last = src_len.saturating_sub(1);
    (0..dst)
        .map(|d| {
            let pos = ((d as f64 + 0.5) * step - 0.5).clamp(0.0, last as f64);
            let i0 = pos.floor() as usize;
            Tap {
                i0,
                i1: (i0 + 1).min(last),
                w: (pos - i0 as f64) as f32,
            }
        })
        .collect()
}

#[inline]
fn sample(plane: &[u8], stride: usize, x: Tap, y: Tap) -> f32 {
    let at = |row: usize, col: usize| f32::from(plane.get(row * stride + col).copied().unwrap_or(0));
    let top = at(y.i0, x.i0) + (at(y.i0, x.i1) - at(y.i0, x.i0)) * x.w;
    let bottom = at(y.i1, x.i0) + (at(y.i1, x.i1) - at(y.i1, x.i0)) * x.w;
    top + (bottom - top) * y.w
}

#[derive(Debug, Clone)]
pub struct VideoScaler {
    src: (usize, usize),
    dst: (usize, usize),
    format: ImageFormat,
    coeffs: Coeffs,
    luma_x: Vec<Tap>,
    luma_y: Vec<Tap>,
    chroma_x: Vec<Tap>,
    chroma_y: Vec<Tap>,
}

impl VideoScaler {
    /// Builds a scaler for `src` frames producing `dst` images.
    ///
    /// `(0, 0)` keeps the source size; a single zero dimension is derived
    /// from the other one, preserving the aspect ratio.
    ///
    /// # Errors
    /// `InvalidSize` for an empty source.
    pub fn new(
        src: (usize, usize),
        color: ColorInfo,
        dst: (usize, usize),
        format: ImageFormat,
    ) -> Result<Self, MediaError> {
        let (sw, sh) = src;
        if sw == 0 || sh == 0 {
            return Err(MediaError::InvalidSize(sw, sh));
        }
        let (dw, dh) = match dst {
            (0, 0) => src,
            (0, h) => (((sw * h + sh / 2) / sh).max(1), h),
            (w, 0) => (w, ((sh * w + sw / 2) / sw).max(1)),
            d => d,
        };

        let step_x = sw as f64 / dw as f64;
        let step_y = sh as f64 / dh as f64;
        Ok(Self {
            src,
            dst: (dw, dh),
            format,
            coeffs: Coeffs::new(color),
            luma_x: taps(sw, step_x, dw),
            luma_y: taps(sh, step_y, dh),
            chroma_x: taps(sw.div_ceil(2), step_x / 2.0, dw),
            chroma_y: taps(sh.div_ceil(2), step_y / 2.0, dh),
        })
    }

    /// Scaler sized from a decoded frame.
    ///
    /// # Errors
    /// See [`VideoScaler::new`].
    pub fn for_frame(
        frame: &VideoFrame,
        dst: (usize, usize),
        format: ImageFormat,
    ) -> Result<Self, MediaError> {
        Self::new((frame.width, frame.height), frame.color, dst, format)
    }

    #[must_use]
    pub fn source_size(&self) -> (usize, usize) {
        self.src
    }

    #[must_use]
    pub fn output_size(&self) -> (usize, usize) {
        self.dst
    }

    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Converts `frame` into `out` as tightly packed rows.
    ///
    /// # Errors
    /// `FrameSizeMismatch` when the frame geometry differs from the one the
    /// scaler was built for.
    pub fn convert(&self, frame: &VideoFrame, out: &mut Vec<u8>) -> Result<(), MediaError> {
        if (frame.width, frame.height) != self.src {
            return Err(MediaError::FrameSizeMismatch {
                expected: self.src,
                got: (frame.width, frame.height),
            });
        }
        let (dw, dh) = self.dst;
        out.clear();
        out.resize(dw * dh * 3, 0);

        for (row, (&ly, &cy)) in out
            .chunks_exact_mut(dw * 3)
            .zip(self.luma_y.iter().zip(&self.chroma_y))
        {
            for (px, (&lx, &cx)) in row
                .chunks_exact_mut(3)
                .zip(self.luma_x.iter().zip(&self.chroma_x))
            {
                let y = sample(&frame.y, frame.y_stride, lx, ly);
                let u = sample(&frame.u, frame.uv_stride, cx, cy);
                let v = sample(&frame.v, frame.uv_stride, cx, cy);
                let [r, g, b] = self.coeffs.to_rgb(y, u, v);
                match self.format {
                    ImageFormat::Rgb => px.copy_from_slice(&[r, g, b]),
                    ImageFormat::Bgr => px.copy_from_slice(&[b, g, r]),
                }
            }
        }
        Ok(())
    }
}
