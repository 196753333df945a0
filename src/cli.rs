//! Arguments and start-up shared by the command line tools.

use std::{path::PathBuf, sync::Arc};

use clap::Args;

use crate::{
    camera::{CameraError, CameraSettings},
    config::Config,
    log::{LogSink, Logger},
    rtsp::Transport,
};

#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// INI file with [Camera], [Rtsp] and [Logging] sections.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request RTP over the RTSP connection instead of UDP.
    #[arg(long)]
    pub tcp: bool,
}

impl CommonArgs {
    /// The `--config` file, or an empty config when none was given.
    ///
    /// # Errors
    /// A message naming the file when it cannot be read.
    pub fn load_config(&self) -> Result<Config, String> {
        match &self.config {
            Some(path) => Config::load(&path.to_string_lossy()),
            None => Ok(Config::empty()),
        }
    }

    /// Camera settings from `config` with command line overrides applied.
    ///
    /// # Errors
    /// See [`CameraSettings::from_config`].
    pub fn settings(&self, config: &Config) -> Result<CameraSettings, CameraError> {
        let mut settings = CameraSettings::from_config(config)?;
        if self.tcp {
            settings.client.transport = Transport::Tcp;
        }
        Ok(settings)
    }
}

/// Starts the file logger for `app`; warnings and errors are mirrored to
/// stderr. Keep the returned [`Logger`] alive for the process lifetime.
#[must_use]
pub fn start_logger(config: &Config, app: &str) -> (Logger, Arc<dyn LogSink>) {
    let logger = Logger::from_config(config, app, true);
    let sink: Arc<dyn LogSink> = Arc::new(logger.handle());
    (logger, sink)
}

/// Line printed when reading a frame fails. The read loop ends either way;
/// only [`CameraError::EndOfStream`] counts as a clean exit.
#[must_use]
pub fn read_failure(e: &CameraError) -> (String, bool) {
    (format!("Error: {e}"), matches!(e, CameraError::EndOfStream))
}
