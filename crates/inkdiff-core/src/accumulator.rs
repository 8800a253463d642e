//! Block accumulator: decides which removed and added lines get aligned

use crate::align::Aligner;
use crate::error::InkdiffError;
use crate::palette::{Role, RESET};
use crate::tokenize::tokenize;
use std::io::Write;

/// How a diff line is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Starts with `-`
    Removed,
    /// Starts with `+`
    Added,
    /// Anything else, passed through unchanged
    Context,
}

impl LineClass {
    pub fn of(line: &[u8]) -> Self {
        match line.first() {
            Some(b'-') => LineClass::Removed,
            Some(b'+') => LineClass::Added,
            _ => LineClass::Context,
        }
    }
}

/// Whether anything is waiting to be flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Collecting,
}

/// Buffers a block of removed lines and the added lines that follow it, then
/// renders them together on the next flush.
///
/// Whole lines are buffered, markers and terminators included, and each
/// buffer is tokenized as one unit so alignment works across line breaks.
#[derive(Debug, Default)]
pub struct BlockAccumulator {
    aligner: Aligner,
    minus_buf: Vec<u8>,
    plus_buf: Vec<u8>,
}

impl BlockAccumulator {
    pub fn new(aligner: Aligner) -> Self {
        Self {
            aligner,
            minus_buf: Vec::new(),
            plus_buf: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        if self.minus_buf.is_empty() && self.plus_buf.is_empty() {
            State::Idle
        } else {
            State::Collecting
        }
    }

    /// Feed one line, terminator included, writing whatever becomes final
    pub fn push_line<W: Write>(&mut self, line: &[u8], out: &mut W) -> Result<(), InkdiffError> {
        match LineClass::of(line) {
            LineClass::Removed => {
                // A new removed block closes the previous pair.
                if !self.plus_buf.is_empty() {
                    self.flush(out)?;
                }
                self.minus_buf.extend_from_slice(line);
            }
            LineClass::Added => {
                if self.minus_buf.is_empty() {
                    let painted = self.aligner.paint(Role::InsertedChanged, &tokenize(line));
                    out.write_all(&painted)?;
                } else {
                    self.plus_buf.extend_from_slice(line);
                }
            }
            LineClass::Context => {
                self.flush(out)?;
                out.write_all(line)?;
            }
        }
        Ok(())
    }

    /// Render everything buffered and start over with empty buffers
    pub fn flush<W: Write>(&mut self, out: &mut W) -> Result<(), InkdiffError> {
        let result = self.render(out);
        self.reset();
        result
    }

    /// Flush at end of input
    pub fn finish<W: Write>(&mut self, out: &mut W) -> Result<(), InkdiffError> {
        self.flush(out)
    }

    fn render<W: Write>(&self, out: &mut W) -> Result<(), InkdiffError> {
        match (self.minus_buf.is_empty(), self.plus_buf.is_empty()) {
            (false, false) => {
                log::debug!(
                    "aligning {} removed bytes against {} added bytes",
                    self.minus_buf.len(),
                    self.plus_buf.len()
                );
                let aligned = self
                    .aligner
                    .align(&tokenize(&self.minus_buf), &tokenize(&self.plus_buf));
                out.write_all(&aligned.removed)?;
                out.write_all(&aligned.added)?;
                out.write_all(RESET.as_bytes())?;
            }
            (false, true) => {
                log::debug!("flushing {} removed bytes", self.minus_buf.len());
                let painted = self
                    .aligner
                    .paint(Role::DeletedChanged, &tokenize(&self.minus_buf));
                out.write_all(&painted)?;
            }
            (true, false) => {
                log::debug!("flushing {} added bytes", self.plus_buf.len());
                let painted = self
                    .aligner
                    .paint(Role::InsertedChanged, &tokenize(&self.plus_buf));
                out.write_all(&painted)?;
            }
            (true, true) => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.minus_buf.clear();
        self.plus_buf.clear();
    }
}
