//! Shows a camera stream in an OpenCV window. `q` quits, space pauses.

use std::process::ExitCode;

use clap::Parser;
use opencv::{
    core::{self, Mat, Scalar},
    highgui, imgproc,
    prelude::*,
};
use rtspcam::{
    camera::RtspCamera,
    cli::{CommonArgs, read_failure, start_logger},
    media::{Image, ImageFormat},
};

const WINDOW: &str = "rtspcam";

#[derive(Parser)]
#[command(version, about = "Display an RTSP camera in a window")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Output width; 0 keeps the stream's width.
    #[arg(long, default_value_t = 0)]
    width: usize,

    /// Output height; 0 keeps the stream's height.
    #[arg(long, default_value_t = 0)]
    height: usize,

    /// Show the picture at full size instead of halving it.
    #[arg(long)]
    full_size: bool,

    /// rtsp:// URL of the camera.
    url: String,
}

fn to_mat(image: &Image) -> opencv::Result<Mat> {
    let rows = i32::try_from(image.height).unwrap_or(i32::MAX);
    let cols = i32::try_from(image.width).unwrap_or(i32::MAX);
    let mut mat = Mat::new_rows_cols_with_default(rows, cols, core::CV_8UC3, Scalar::all(0.))?;
    let dst = mat.data_bytes_mut()?;
    let row_len = image.width * 3;
    for (dst_row, src_row) in dst
        .chunks_exact_mut(row_len)
        .zip(image.data.chunks(image.stride))
    {
        dst_row.copy_from_slice(&src_row[..row_len]);
    }
    Ok(mat)
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = cli.common.load_config()?;
    let settings = cli.common.settings(&config).map_err(|e| e.to_string())?;
    let (_logger, log) = start_logger(&config, "rtspcam-view");

    println!("Connecting to {}...", cli.url);
    let mut camera = RtspCamera::open_with(&cli.url, settings, log).map_err(|e| e.to_string())?;
    camera.set_image_format(ImageFormat::Bgr);
    if cli.width != 0 || cli.height != 0 {
        camera.set_size(cli.width, cli.height);
    }

    let cv = |e: opencv::Error| e.to_string();
    highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE).map_err(cv)?;

    let mut image = Image::default();
    let mut paused = false;
    loop {
        if let Err(e) = camera.read_into(&mut image) {
            let (msg, clean) = read_failure(&e);
            if clean {
                eprintln!("{msg}");
                return Ok(());
            }
            return Err(msg);
        }

        let mut mat = to_mat(&image).map_err(cv)?;
        if !cli.full_size {
            let mut small = Mat::default();
            imgproc::pyr_down_def(&mat, &mut small).map_err(cv)?;
            mat = small;
        }
        highgui::imshow(WINDOW, &mat).map_err(cv)?;

        let key = if paused {
            highgui::wait_key(0)
        } else {
            highgui::poll_key()
        }
        .map_err(cv)?;
        match u8::try_from(key).ok() {
            Some(b'q') => return Ok(()),
            Some(b' ') => paused = !paused,
            _ => {}
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
