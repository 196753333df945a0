use std::fmt;

/// YUV to RGB matrix signalled by the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMatrix {
    #[default]
    Bt601,
    Bt709,
}

impl fmt::Display for ColorMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMatrix::Bt601 => f.write_str("BT.601"),
            ColorMatrix::Bt709 => f.write_str("BT.709"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorInfo {
    /// Full-range (0..255) samples instead of limited (16..235).
    pub full_range: bool,
    pub matrix: ColorMatrix,
}

/// A decoded picture in planar YUV 4:2:0.
///
/// Frames travel through a `Swapper`, so the plane buffers are reused from
/// one picture to the next instead of reallocated.
#[derive(Debug, Clone, Default)]
pub struct VideoFrame {
    pub width: usize,
    pub height: usize,
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub y_stride: usize,
    pub uv_stride: usize,
    pub color: ColorInfo,
    /// Wall-clock decode time.
    pub timestamp_ms: u128,
}

impl VideoFrame {
    #[must_use]
    pub fn chroma_size(&self) -> (usize, usize) {
        (self.width.div_ceil(2), self.height.div_ceil(2))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// A uniformly coloured frame with tight strides.
    #[must_use]
    pub fn solid(width: usize, height: usize, yuv: (u8, u8, u8), color: ColorInfo) -> Self {
        let (cw, ch) = (width.div_ceil(2), height.div_ceil(2));
        Self {
            width,
            height,
            y: vec![yuv.0; width * height],
            u: vec![yuv.1; cw * ch],
            v: vec![yuv.2; cw * ch],
            y_stride: width,
            uv_stride: cw,
            color,
            timestamp_ms: 0,
        }
    }
}
