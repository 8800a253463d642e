//! Inkdiff Core - word-level coloring for unified diff output
//!
//! Lines are classified as removed, added or context. Runs of removed lines
//! and the added lines that follow them are buffered as blocks, tokenized,
//! aligned token by token and rendered with ANSI colors.

pub mod accumulator;
pub mod align;
pub mod error;
pub mod palette;
pub mod tokenize;

pub use accumulator::{BlockAccumulator, LineClass, State};
pub use align::{Aligned, Aligner, Matcher};
pub use error::InkdiffError;
pub use palette::{Palette, PaletteColor, Role, RoleStyle, RESET};
pub use tokenize::{tokenize, Token, TokenKind};
