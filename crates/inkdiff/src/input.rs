//! Line-oriented input from files or stdin

use anyhow::{Context, Result};
use inkdiff_core::BlockAccumulator;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One input to read lines from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => write!(f, "<stdin>"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Source {
    pub fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            Source::Stdin => Ok(Box::new(io::stdin().lock())),
            Source::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

/// Inputs in order. No paths means stdin, and `-` stands for stdin too.
pub fn sources(files: &[PathBuf]) -> Vec<Source> {
    if files.is_empty() {
        return vec![Source::Stdin];
    }
    files
        .iter()
        .map(|path| {
            if path == Path::new("-") {
                Source::Stdin
            } else {
                Source::File(path.clone())
            }
        })
        .collect()
}

/// Feed every line of `reader` to the accumulator, terminators included.
///
/// Lines are raw bytes; nothing is decoded, so invalid UTF-8 passes through.
pub fn pump<R: BufRead + ?Sized, W: Write>(
    reader: &mut R,
    acc: &mut BlockAccumulator,
    out: &mut W,
) -> Result<usize> {
    let mut line = Vec::new();
    let mut count = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(count);
        }
        acc.push_line(&line, out)?;
        count += 1;
    }
}
