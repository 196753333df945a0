//! Turns a log of `"<label> | <hex>"` lines back into a binary stream.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use rtspcam::convert::convert_file;

#[derive(Parser)]
#[command(version, about = "Convert a hex log into a .h264 file")]
struct Cli {
    /// Skip lines that are not hex payloads instead of failing.
    #[arg(short, long)]
    lenient: bool,

    /// Text file with one "<label> | <hex>" record per line.
    input: PathBuf,

    /// Output file.
    #[arg(default_value = "/tmp/out.h264")]
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match convert_file(&cli.input, &cli.output, cli.lenient) {
        Ok(log) => {
            println!(
                "{} bytes from {} lines written to {}{}",
                log.data.len(),
                log.lines,
                cli.output.display(),
                if log.skipped > 0 {
                    format!(" ({} lines skipped)", log.skipped)
                } else {
                    String::new()
                }
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", cli.input.display());
            ExitCode::FAILURE
        }
    }
}
