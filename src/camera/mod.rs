//! Public camera API: open a stream, read converted images.
pub mod camera_error;
pub mod rtsp_camera;
pub mod settings;

pub use camera_error::CameraError;
pub use rtsp_camera::RtspCamera;
pub use settings::CameraSettings;
