use std::{
    fmt,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
};

use crate::media::media_error::MediaError;

/// Byte order of packed 24-bit pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Rgb,
    Bgr,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Rgb => f.write_str("rgb"),
            ImageFormat::Bgr => f.write_str("bgr"),
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb" | "rgb24" => Ok(ImageFormat::Rgb),
            "bgr" | "bgr24" => Ok(ImageFormat::Bgr),
            other => Err(format!("unknown image format '{other}'")),
        }
    }
}

/// A converted picture: packed 24-bit pixels, rows `stride` bytes apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    /// Position of the source frame in the stream, starting at 0.
    pub index: u64,
    pub format: ImageFormat,
}

impl Image {
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = y * self.stride + x * 3;
        let px = self.data.get(off..off + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Writes a binary PPM (`P6`, maxval 255).
    ///
    /// # Errors
    /// Any I/O error from creating or writing the file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MediaError> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_ppm(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// # Errors
    /// Any I/O error from `w`.
    pub fn write_ppm<W: Write>(&self, w: &mut W) -> Result<(), MediaError> {
        write!(w, "P6\n{} {}\n255\n", self.width, self.height)?;
        let row_len = self.width * 3;
        let mut swapped = Vec::new();
        for row in self.data.chunks(self.stride.max(1)).take(self.height) {
            let row = row.get(..row_len).ok_or(MediaError::InvalidSize(self.width, self.height))?;
            match self.format {
                ImageFormat::Rgb => w.write_all(row)?,
                ImageFormat::Bgr => {
                    swapped.clear();
                    for px in row.chunks_exact(3) {
                        swapped.extend_from_slice(&[px[2], px[1], px[0]]);
                    }
                    w.write_all(&swapped)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn two_by_one(format: ImageFormat) -> Image {
        Image {
            data: vec![1, 2, 3, 4, 5, 6],
            width: 2,
            height: 1,
            stride: 6,
            index: 0,
            format,
        }
    }

    #[test]
    fn ppm_rgb_is_written_as_is() {
        let mut out = Vec::new();
        two_by_one(ImageFormat::Rgb).write_ppm(&mut out).unwrap();
        assert_eq!(out, b"P6\n2 1\n255\n\x01\x02\x03\x04\x05\x06");
    }

    #[test]
    fn ppm_bgr_is_swapped() {
        let mut out = Vec::new();
        two_by_one(ImageFormat::Bgr).write_ppm(&mut out).unwrap();
        assert_eq!(&out[11..], &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn save_writes_file() {
        let path = std::env::temp_dir().join(format!("rtspcam-img-{}.ppm", std::process::id()));
        two_by_one(ImageFormat::Rgb).save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P6\n2 1\n255\n"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn pixel_lookup_and_format_parse() {
        let img = two_by_one(ImageFormat::Rgb);
        assert_eq!(img.pixel(1, 0), Some([4, 5, 6]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!("BGR".parse::<ImageFormat>().unwrap(), ImageFormat::Bgr);
        assert!("yuv".parse::<ImageFormat>().is_err());
    }
}
