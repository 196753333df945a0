//! Decodes an Annex-B .h264 file and reports every produced frame.

use std::{fs, path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use rtspcam::{
    h264::{START_CODE, split_annexb},
    log::{LogSink, StderrLogSink},
    media::{H264Decoder, Image, VideoFrame, VideoScaler},
};

#[derive(Parser)]
#[command(version, about = "Decode an H.264 elementary stream")]
struct Cli {
    /// Save the last decoded frame as a PPM image.
    #[arg(long, value_name = "FILE")]
    save_last: Option<PathBuf>,

    /// Annex-B H.264 file.
    input: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let data = match fs::read(&cli.input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let log: Arc<dyn LogSink> = Arc::new(StderrLogSink::default());
    let mut decoder = match H264Decoder::new(log) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut frame = VideoFrame::default();
    let mut unit = Vec::new();
    let mut errors = 0u64;
    for nal in split_annexb(&data) {
        unit.clear();
        unit.extend_from_slice(&START_CODE);
        unit.extend_from_slice(nal);
        match decoder.decode(&unit, &mut frame) {
            Ok(true) => {
                if decoder.frames_decoded() == 1 {
                    print_stream_info(&decoder, &frame);
                }
                println!("frame {:04}", decoder.frames_decoded() - 1);
            }
            Ok(false) => {}
            Err(e) => {
                errors += 1;
                eprintln!("{e}");
            }
        }
    }
    println!("{} frames, {} errors", decoder.frames_decoded(), errors);

    if let Some(path) = cli.save_last {
        if frame.is_empty() {
            eprintln!("no frame decoded; nothing to save");
            return ExitCode::FAILURE;
        }
        let mut image = Image::default();
        let saved = VideoScaler::for_frame(&frame, (0, 0), image.format).and_then(|s| {
            s.convert(&frame, &mut image.data)?;
            (image.width, image.height) = s.output_size();
            image.stride = image.width * 3;
            image.save(&path)
        });
        if let Err(e) = saved {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }

    if decoder.frames_decoded() == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_stream_info(decoder: &H264Decoder, frame: &VideoFrame) {
    println!("codec:           H.264 (openh264)");
    println!("width:           {}", frame.width);
    println!("height:          {}", frame.height);
    println!(
        "color range:     {}",
        if frame.color.full_range { "full" } else { "limited" }
    );
    println!("color matrix:    {}", frame.color.matrix);
    if let Some(sps) = decoder.sps() {
        println!("profile:         {}", sps.profile_name());
        println!("level:           {}.{}", sps.level_idc / 10, sps.level_idc % 10);
    }
    println!("pix_fmt:         yuv420p");
}
