use std::{sync::Arc, time::Duration};

use crate::{
    camera::{camera_error::CameraError, settings::CameraSettings},
    log::{LogSink, NoopLogSink},
    media::{AccessUnitSink, Decoder, Image, ImageFormat, VideoFrame, VideoScaler},
    rtsp::{RtspClient, SinkFactory},
    sink_info, sink_warn,
    sync::{ErrorSlot, Swapper},
};

/// How long `read` waits for a frame before polling the error slot.
const FRAME_POLL: Duration = Duration::from_millis(100);

/// Pulls decoded, converted pictures from an H.264 RTSP stream.
///
/// ```no_run
/// # use rtspcam::camera::RtspCamera;
/// let mut cam = RtspCamera::open("rtsp://192.168.1.10/stream1")?;
/// let img = cam.read()?;
/// img.save("/tmp/image.ppm")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct RtspCamera {
    client: RtspClient,
    frames: Arc<Swapper<VideoFrame>>,
    error_slot: Arc<ErrorSlot>,
    frame: VideoFrame,
    scaler: Option<VideoScaler>,
    format: ImageFormat,
    size: (usize, usize),
    logger: Arc<dyn LogSink>,
}

impl RtspCamera {
    /// Opens `url` with default settings and no logging.
    ///
    /// # Errors
    /// See [`RtspCamera::open_with`].
    pub fn open(url: &str) -> Result<Self, CameraError> {
        Self::open_with(url, CameraSettings::default(), Arc::new(NoopLogSink))
    }

    /// Starts the RTSP session. Connection and protocol failures surface
    /// later, from [`RtspCamera::read`].
    ///
    /// # Errors
    /// `Rtsp` for an invalid URL or when the client thread cannot start.
    pub fn open_with(
        url: &str,
        settings: CameraSettings,
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, CameraError> {
        let frames = Arc::new(Swapper::new(VideoFrame::default()));
        let error_slot = Arc::new(ErrorSlot::new());

        let factory_frames = Arc::clone(&frames);
        let factory_logger = Arc::clone(&logger);
        let factory: SinkFactory = Box::new(move |_info| {
            Decoder::spawn(Arc::clone(&factory_frames), Arc::clone(&factory_logger))
                .map(|d| Box::new(d) as Box<dyn AccessUnitSink>)
                .map_err(|e| e.to_string())
        });

        sink_info!(logger, "[Camera] opening {}", url);
        let client = RtspClient::start(
            url,
            settings.client,
            factory,
            Arc::clone(&error_slot),
            Arc::clone(&logger),
        )?;

        Ok(Self {
            client,
            frames,
            error_slot,
            frame: VideoFrame::default(),
            scaler: None,
            format: settings.image_format,
            size: (settings.width, settings.height),
            logger,
        })
    }

    /// Selects the pixel order. Ignored once the first frame was read.
    pub fn set_image_format(&mut self, format: ImageFormat) -> bool {
        if self.scaler.is_some() {
            sink_warn!(self.logger, "[Camera] image format is fixed after the first frame");
            return false;
        }
        self.format = format;
        true
    }

    /// Selects the output size; `(0, 0)` keeps the stream's size. Ignored
    /// once the first frame was read.
    pub fn set_size(&mut self, width: usize, height: usize) -> bool {
        if self.scaler.is_some() {
            sink_warn!(self.logger, "[Camera] image size is fixed after the first frame");
            return false;
        }
        self.size = (width, height);
        true
    }

    /// Blocks until the newest decoded frame is available and converts it.
    ///
    /// # Errors
    /// `Stream` with the client's message when the session failed,
    /// `EndOfStream` when it ended, `Media` when conversion fails.
    pub fn read(&mut self) -> Result<Image, CameraError> {
        let mut image = Image::default();
        self.read_into(&mut image)?;
        Ok(image)
    }

    /// Like [`RtspCamera::read`], reusing `image`'s buffer.
    ///
    /// # Errors
    /// See [`RtspCamera::read`].
    pub fn read_into(&mut self, image: &mut Image) -> Result<(), CameraError> {
        let index = loop {
            let spare = std::mem::take(&mut self.frame);
            match self.frames.try_pop(spare, FRAME_POLL) {
                Ok((frame, index)) => {
                    self.frame = frame;
                    break index;
                }
                Err(spare) => {
                    self.frame = spare;
                    if let Some(msg) = self.error_slot.check() {
                        return Err(if msg.is_empty() {
                            CameraError::EndOfStream
                        } else {
                            CameraError::Stream(msg)
                        });
                    }
                }
            }
        };

        self.refresh_scaler()?;
        let Some(scaler) = self.scaler.as_ref() else {
            return Err(CameraError::Stream("scaler unavailable".into()));
        };
        scaler.convert(&self.frame, &mut image.data)?;
        let (width, height) = scaler.output_size();
        image.width = width;
        image.height = height;
        image.stride = width * 3;
        image.index = index;
        image.format = scaler.format();
        Ok(())
    }

    /// Stops the session and joins its threads.
    pub fn close(&mut self) {
        self.client.quit();
    }

    /// Builds the scaler on the first frame and rebuilds it when the
    /// stream geometry changes.
    fn refresh_scaler(&mut self) -> Result<(), CameraError> {
        let geometry = (self.frame.width, self.frame.height);
        let stale = match &self.scaler {
            None => true,
            Some(s) => s.source_size() != geometry,
        };
        if stale {
            let (format, size) = match &self.scaler {
                Some(s) => {
                    sink_warn!(
                        self.logger,
                        "[Camera] stream size changed to {}x{}",
                        geometry.0,
                        geometry.1
                    );
                    (s.format(), self.size)
                }
                None => (self.format, self.size),
            };
            let scaler = VideoScaler::for_frame(&self.frame, size, format)?;
            let (w, h) = scaler.output_size();
            sink_info!(
                self.logger,
                "[Camera] converting {}x{} -> {}x{} {}",
                geometry.0,
                geometry.1,
                w,
                h,
                format
            );
            self.scaler = Some(scaler);
        }
        Ok(())
    }
}

impl Drop for RtspCamera {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn invalid_url_is_rejected_immediately() {
        assert!(matches!(
            RtspCamera::open("http://example.com/"),
            Err(CameraError::Rtsp(_))
        ));
    }

    #[test]
    fn unreachable_server_fails_read() {
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let mut cam = RtspCamera::open(&format!("rtsp://127.0.0.1:{port}/")).unwrap();
        assert!(cam.set_size(320, 240));
        assert!(cam.set_image_format(ImageFormat::Bgr));
        match cam.read() {
            Err(CameraError::Stream(msg)) => assert!(msg.contains("Failed to connect")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pushed_frames_are_scaled_and_rescaled_on_geometry_change() {
        use crate::media::ColorInfo;

        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let mut cam = RtspCamera::open(&format!("rtsp://127.0.0.1:{port}/")).unwrap();
        assert!(cam.set_size(32, 0));

        cam.frames
            .push(VideoFrame::solid(64, 48, (235, 128, 128), ColorInfo::default()));
        let img = cam.read().unwrap();
        assert_eq!((img.width, img.height, img.stride), (32, 24, 96));
        assert_eq!(img.index, 0);
        assert_eq!(img.format, ImageFormat::Rgb);
        assert!(img.pixel(5, 5).unwrap().iter().all(|&c| c >= 250));
        assert!(!cam.set_size(10, 10));
        assert!(!cam.set_image_format(ImageFormat::Bgr));

        cam.frames
            .push(VideoFrame::solid(80, 40, (16, 128, 128), ColorInfo::default()));
        let img = cam.read().unwrap();
        assert_eq!((img.width, img.height), (32, 16));
        assert_eq!(img.index, 1);
        assert!(img.pixel(0, 0).unwrap().iter().all(|&c| c <= 5));
    }
}
