//! Error types for inkdiff

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InkdiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InkdiffError {
    /// True when the reader on the other end of the output went away
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            InkdiffError::Io(err) => err.kind() == std::io::ErrorKind::BrokenPipe,
        }
    }
}
