//! inkdiff - colorize unified diff output with word-level highlighting
//!
//! Reads diff lines from the given files (or stdin) and writes them back
//! with removed and added blocks aligned token by token.

mod config;
mod input;

use anyhow::Result;
use clap::Parser;
use config::Config;
use inkdiff_core::{Aligner, BlockAccumulator, InkdiffError};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkdiff")]
#[command(about = "Colorize unified diffs with word-level highlighting", long_about = None)]
#[command(version)]
struct Cli {
    /// Diff files to read ("-" or nothing for stdin)
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::init();

    let config = Config::load()?;
    let aligner = Aligner::new(config.matcher, config.palette());
    log::info!("Using {:?} matcher", aligner.matcher());

    match run(&cli.files, aligner) {
        Err(err) if is_broken_pipe(&err) => {
            log::debug!("Output closed early");
            Ok(())
        }
        other => other,
    }
}

fn run(files: &[PathBuf], aligner: Aligner) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut acc = BlockAccumulator::new(aligner);

    for source in input::sources(files) {
        let mut reader = source.open()?;
        let lines = input::pump(&mut reader, &mut acc, &mut out)?;
        log::debug!("Read {} lines from {}", lines, source);
    }

    acc.finish(&mut out)?;
    out.flush()?;
    Ok(())
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(err) = cause.downcast_ref::<InkdiffError>() {
            return err.is_broken_pipe();
        }
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|err| err.kind() == io::ErrorKind::BrokenPipe)
    })
}
