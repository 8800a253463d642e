//! Tokenizer for word-level diffing
//!
//! A line (or a whole buffered block of lines) is split into words, runs of
//! spaces, trailing-space-plus-newline units and single characters. The
//! concatenation of the tokens always reproduces the input byte-for-byte.

use regex::bytes::Regex;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Alternatives in priority order: word run, spaces before a line break,
/// plain spaces, one UTF-8 character, one raw byte.
const TOKEN_PATTERN: &str = r"[A-Za-z0-9_]+| *\r*\n| +|(?s:.)|(?s-u:.)";

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

/// Which alternative of the tokenizer produced a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Maximal run of `[A-Za-z0-9_]`
    Word,
    /// Optional spaces followed by `\r*\n`
    LineEnd,
    /// Run of spaces not followed by a line break
    Spaces,
    /// Any other single character (or a single byte of invalid UTF-8)
    Char,
}

impl TokenKind {
    fn classify(text: &[u8]) -> Self {
        match text {
            [first, ..] if first.is_ascii_alphanumeric() || *first == b'_' => TokenKind::Word,
            [.., b'\n'] => TokenKind::LineEnd,
            [b' ', ..] => TokenKind::Spaces,
            _ => TokenKind::Char,
        }
    }
}

/// A slice of the original text. Two tokens are equal when their bytes are.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    text: &'a [u8],
    kind: TokenKind,
}

impl<'a> Token<'a> {
    pub fn text(&self) -> &'a [u8] {
        self.text
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Split a `spaces + \r* + \n` token into its space run and its line
    /// terminator. Returns `None` for every other token shape.
    pub fn split_line_end(&self) -> Option<(&'a [u8], &'a [u8])> {
        let spaces = self.text.iter().take_while(|&&b| b == b' ').count();
        let (run, terminator) = self.text.split_at(spaces);
        match terminator.split_last() {
            Some((b'\n', returns)) if returns.iter().all(|&b| b == b'\r') => {
                Some((run, terminator))
            }
            _ => None,
        }
    }
}

impl PartialEq for Token<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Token<'_> {}

impl PartialOrd for Token<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(other.text)
    }
}

impl Hash for Token<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

/// Split `text` into tokens, left to right.
///
/// Every byte position is matched by at least the single-byte alternative,
/// so the matches are contiguous and cover the whole input.
pub fn tokenize(text: &[u8]) -> Vec<Token<'_>> {
    token_regex()
        .find_iter(text)
        .map(|m| {
            let text = m.as_bytes();
            Token {
                text,
                kind: TokenKind::classify(text),
            }
        })
        .collect()
}
