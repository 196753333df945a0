use std::{str::FromStr, time::Duration};

use crate::{
    camera::camera_error::CameraError, config::Config, media::ImageFormat, rtsp::ClientOptions,
};

/// Typed view of the `[Camera]` and `[Rtsp]` config sections.
#[derive(Debug, Clone, Default)]
pub struct CameraSettings {
    pub image_format: ImageFormat,
    /// Output size; `(0, 0)` keeps the stream's size.
    pub width: usize,
    pub height: usize,
    pub client: ClientOptions,
}

impl CameraSettings {
    /// Reads the settings, falling back to defaults for missing keys.
    ///
    /// # Errors
    /// `Config` when a present value does not parse.
    pub fn from_config(cfg: &Config) -> Result<Self, CameraError> {
        let defaults = Self::default();
        let client_defaults = &defaults.client;

        let image_format = parse_or(cfg, "Camera", "image_format", defaults.image_format)?;
        let width = parse_or(cfg, "Camera", "width", defaults.width)?;
        let height = parse_or(cfg, "Camera", "height", defaults.height)?;

        let transport = parse_or(cfg, "Rtsp", "transport", client_defaults.transport)?;
        let user_agent = cfg
            .get_non_empty_or_default("Rtsp", "user_agent", &client_defaults.user_agent)
            .to_string();
        let connect_timeout = millis_or(cfg, "connect_timeout_ms", client_defaults.connect_timeout)?;
        let response_timeout =
            millis_or(cfg, "response_timeout_ms", client_defaults.response_timeout)?;
        let rtcp_interval = millis_or(cfg, "rtcp_interval_ms", client_defaults.rtcp_interval)?;
        if rtcp_interval.is_zero() {
            return Err(CameraError::Config("[Rtsp] rtcp_interval_ms must be positive".into()));
        }

        Ok(Self {
            image_format,
            width,
            height,
            client: ClientOptions {
                transport,
                user_agent,
                connect_timeout,
                response_timeout,
                rtcp_interval,
                first_keepalive: client_defaults.first_keepalive,
            },
        })
    }
}

fn parse_or<T>(cfg: &Config, section: &str, key: &str, default: T) -> Result<T, CameraError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match cfg.get_non_empty(section, key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| CameraError::Config(format!("[{section}] {key} = {v}: {e}"))),
        None => Ok(default),
    }
}

fn millis_or(cfg: &Config, key: &str, default: Duration) -> Result<Duration, CameraError> {
    let ms = parse_or(cfg, "Rtsp", key, u64::try_from(default.as_millis()).unwrap_or(u64::MAX))?;
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::rtsp::Transport;

    #[test]
    fn defaults_when_sections_missing() {
        let s = CameraSettings::from_config(&Config::empty()).unwrap();
        assert_eq!(s.image_format, ImageFormat::Rgb);
        assert_eq!((s.width, s.height), (0, 0));
        assert_eq!(s.client.transport, Transport::Udp);
        assert_eq!(s.client.user_agent, "rtspcam");
        assert_eq!(s.client.rtcp_interval, Duration::from_secs(5));
    }

    #[test]
    fn reads_every_key() {
        let cfg = Config::parse(
            "[Camera]\nimage_format = bgr\nwidth = 640\nheight = 360\n\
             [Rtsp]\ntransport = tcp\nuser_agent = lab\nconnect_timeout_ms = 1500\nrtcp_interval_ms = 2000\n",
        );
        let s = CameraSettings::from_config(&cfg).unwrap();
        assert_eq!(s.image_format, ImageFormat::Bgr);
        assert_eq!((s.width, s.height), (640, 360));
        assert_eq!(s.client.transport, Transport::Tcp);
        assert_eq!(s.client.user_agent, "lab");
        assert_eq!(s.client.connect_timeout, Duration::from_millis(1500));
        assert_eq!(s.client.rtcp_interval, Duration::from_secs(2));
    }

    #[test]
    fn bad_values_are_reported() {
        let cfg = Config::parse("[Camera]\nwidth = wide\n");
        let err = CameraSettings::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("[Camera] width = wide"));
        let cfg = Config::parse("[Rtsp]\ntransport = sctp\n");
        assert!(CameraSettings::from_config(&cfg).is_err());
        let cfg = Config::parse("[Rtsp]\nrtcp_interval_ms = 0\n");
        assert!(CameraSettings::from_config(&cfg).is_err());
    }
}
