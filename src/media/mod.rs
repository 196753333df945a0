//! Decode pipeline: RTP payloads in, RGB/BGR images out.
pub mod decoder;
pub mod h264_decoder;
pub mod image;
pub mod media_error;
pub mod scaler;
pub mod video_frame;
pub mod video_sink;

pub use decoder::{Decoder, DecoderCommand};
pub use h264_decoder::H264Decoder;
pub use image::{Image, ImageFormat};
pub use media_error::MediaError;
pub use scaler::VideoScaler;
pub use video_frame::{ColorInfo, ColorMatrix, VideoFrame};
pub use video_sink::{AccessUnitSink, VideoSink};
