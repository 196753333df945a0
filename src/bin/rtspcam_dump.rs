//! Records the H.264 elementary stream of a camera to an Annex-B file,
//! optionally also as hex lines for `hex2h264`.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use clap::Parser;
use rtspcam::{
    cli::{CommonArgs, start_logger},
    h264::format_hex_line,
    log::LogSink,
    media::AccessUnitSink,
    rtsp::{RtspClient, SinkFactory},
    sink_error, sink_info,
    sync::ErrorSlot,
};

#[derive(Parser)]
#[command(version, about = "Dump the H.264 stream of an RTSP camera")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Also write every access unit as "au | <hex>" lines to this file.
    #[arg(long, value_name = "FILE")]
    hex: Option<PathBuf>,

    /// Stop after this many seconds.
    #[arg(short, long)]
    duration: Option<u64>,

    /// rtsp:// URL of the camera.
    url: String,

    /// Output .h264 file.
    output: PathBuf,
}

struct FileSink {
    out: BufWriter<File>,
    hex: Option<BufWriter<File>>,
    written: Arc<AtomicU64>,
    failed: bool,
    log: Arc<dyn LogSink>,
}

impl FileSink {
    fn write(&mut self, au: &[u8]) -> std::io::Result<()> {
        self.out.write_all(au)?;
        if let Some(hex) = self.hex.as_mut() {
            writeln!(hex, "{}", format_hex_line("au", au))?;
        }
        Ok(())
    }
}

impl AccessUnitSink for FileSink {
    fn on_access_unit(&mut self, au: &[u8]) {
        if self.failed {
            return;
        }
        match self.write(au) {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                sink_error!(self.log, "[Dump] write failed: {e}");
                self.failed = true;
            }
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.out.flush();
        if let Some(hex) = self.hex.as_mut() {
            let _ = hex.flush();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match cli.common.load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let settings = match cli.common.settings(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let (_logger, log) = start_logger(&config, "rtspcam-dump");

    let written = Arc::new(AtomicU64::new(0));
    let factory: SinkFactory = {
        let output = cli.output.clone();
        let hex_path = cli.hex.clone();
        let written = Arc::clone(&written);
        let log = Arc::clone(&log);
        let mut opened = false;
        Box::new(move |info| {
            if opened {
                return Err(format!("{} not recorded: output already in use", info.control_url));
            }
            let out = File::create(&output).map_err(|e| format!("{}: {e}", output.display()))?;
            let hex = match &hex_path {
                Some(p) => Some(BufWriter::new(
                    File::create(p).map_err(|e| format!("{}: {e}", p.display()))?,
                )),
                None => None,
            };
            opened = true;
            sink_info!(log, "[Dump] recording {} to {}", info.control_url, output.display());
            Ok(Box::new(FileSink {
                out: BufWriter::new(out),
                hex,
                written: Arc::clone(&written),
                failed: false,
                log: Arc::clone(&log),
            }) as Box<dyn AccessUnitSink>)
        })
    };

    let slot = Arc::new(ErrorSlot::new());
    let mut client = match RtspClient::start(
        &cli.url,
        settings.client,
        factory,
        Arc::clone(&slot),
        Arc::clone(&log),
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let deadline = cli.duration.map(|s| Instant::now() + Duration::from_secs(s));
    let outcome = loop {
        if let Some(msg) = slot.check() {
            break msg;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break String::new();
        }
        thread::sleep(Duration::from_millis(100));
    };
    client.quit();

    println!(
        "wrote {} access units to {}",
        written.load(Ordering::Relaxed),
        cli.output.display()
    );
    if outcome.is_empty() {
        ExitCode::SUCCESS
    } else {
        eprintln!("{outcome}");
        ExitCode::FAILURE
    }
}
