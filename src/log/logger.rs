use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, TrySendError},
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

/// Capacity of the record queue used by [`Logger::from_config`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 4_096;

/// Bounded, non-blocking logger writing to a per-process log file.
///
/// Producers enqueue through a [`LoggerHandle`]; a `logger-worker` thread
/// drains the queue into the file and flushes every `FLUSH_BATCH_SIZE` lines.
/// Warn and Error records are mirrored to stderr when `mirror_stderr` is on,
/// so a command-line user sees why a stream stopped without opening the file.
///
/// Dropping the `Logger` does not stop the worker while handles are alive;
/// the worker exits once the last handle is gone.
pub struct Logger {
    handle: LoggerHandle,
    _thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts a logger from the `[Logging]` section of `config`.
    ///
    /// `log_path` picks the directory (default: `logs/` next to the
    /// executable) and `log_filename` the file prefix (default: `app_name`).
    #[must_use]
    pub fn from_config(config: &Config, app_name: &str, mirror_stderr: bool) -> Self {
        let prefix = config.get_non_empty_or_default("Logging", "log_filename", app_name);
        let dir = config
            .get_non_empty("Logging", "log_path")
            .map_or_else(|| exe_dir_fallback_cwd().join("logs"), expand_path);
        Self::start_in_dir(dir, Some(prefix), DEFAULT_QUEUE_CAPACITY, mirror_stderr)
    }

    /// Starts the logger in `dir`, creating it if missing.
    ///
    /// The file is named `<app>-<YYYYMMDD_HHMMSS>-pid<pid>.log`. If it cannot
    /// be opened the worker falls back to a file in the temp dir, then to a
    /// sink; logging never panics.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: Option<&str>,
        cap: usize,
        mirror_stderr: bool,
    ) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let ts = timestamp_for_filename();
        let pid = std::process::id();
        let fname = match app_name {
            Some(name) => format!("{name}-{ts}-pid{pid}.log"),
            None => format!("{ts}-pid{pid}.log"),
        };
        let file_path = dir.join(fname);

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap.max(1));
        let worker_path = file_path.clone();

        let _thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || {
                let writer: Box<dyn Write + Send> =
                    match OpenOptions::new().create(true).append(true).open(&worker_path) {
                        Ok(f) => Box::new(f),
                        Err(_) => {
                            let fallback = std::env::temp_dir().join("rtspcam-fallback.log");
                            match OpenOptions::new().create(true).append(true).open(fallback) {
                                Ok(f) => Box::new(f),
                                Err(_) => Box::new(io::sink()),
                            }
                        }
                    };
                let mut out = BufWriter::new(writer);
                let mut lines_written: u32 = 0;

                while let Ok(m) = rx.recv() {
                    let _ = writeln!(&mut out, "{}", m.to_line());
                    lines_written = lines_written.wrapping_add(1);
                    if lines_written % FLUSH_BATCH_SIZE == 0 {
                        let _ = out.flush();
                    }
                    if mirror_stderr && m.level >= LogLevel::Warn {
                        eprintln!("[{}] {}", m.level, m.text);
                    }
                }

                let _ = out.flush();
            })
            .ok();

        Self {
            handle: LoggerHandle { tx },
            _thread,
            file_path,
        }
    }

    /// Enqueues a record without blocking.
    ///
    /// # Errors
    /// Returns the record back when the queue is full or the worker is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// `YYYYMMDD_HHMMSS` in UTC, computed without a date-time dependency.
fn timestamp_for_filename() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let (year, mon, day) = civil_from_days(secs / 86_400);
    let rem = secs % 86_400;
    format!(
        "{year:04}{mon:02}{day:02}_{:02}{:02}{:02}",
        rem / 3_600,
        (rem % 3_600) / 60,
        rem % 60
    )
}

/// Days since 1970-01-01 to a Gregorian (year, month, day).
#[allow(clippy::many_single_char_names)]
fn civil_from_days(days: u64) -> (i64, u32, u32) {
    let z = i64::try_from(days).unwrap_or(0) + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    (y, m as u32, d as u32)
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix('~') {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from);
        if let Some(mut home) = home {
            if rest.is_empty() {
                return home;
            }
            if let Some(tail) = rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\')) {
                home.push(tail);
                return home;
            }
        }
    }
    PathBuf::from(path_str)
}
