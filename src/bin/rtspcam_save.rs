//! Reads frames from a camera and keeps overwriting one PPM file with the
//! newest picture.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use rtspcam::{
    camera::{CameraError, RtspCamera},
    cli::{CommonArgs, start_logger},
    sink_info,
};

#[derive(Parser)]
#[command(version, about = "Save the newest camera frame as a PPM image")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Output image.
    #[arg(short, long, default_value = "/tmp/image.ppm")]
    output: PathBuf,

    /// Stop after this many frames.
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// rtsp:// URL of the camera.
    url: String,
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
    let (_logger, log) = start_logger(&config, "rtspcam-save");

    println!("Connecting to {}...", cli.url);
    let mut camera = match RtspCamera::open_with(&cli.url, settings, log.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut saved = 0u64;
    loop {
        if cli.count.is_some_and(|n| saved >= n) {
            return ExitCode::SUCCESS;
        }
        let image = match camera.read() {
            Ok(img) => img,
            Err(CameraError::EndOfStream) => {
                println!("end of stream after {saved} frames");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = image.save(&cli.output) {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
        saved += 1;
        sink_info!(
            log,
            "[Save] frame {} ({}x{}) -> {}",
            image.index,
            image.width,
            image.height,
            cli.output.display()
        );
    }
}
