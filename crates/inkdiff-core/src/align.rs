//! Token alignment between a removed block and an added block

use crate::palette::{Palette, Role, RESET};
use crate::tokenize::Token;
use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp, DiffTag};
use std::collections::HashMap;
use std::hash::Hash;
use std::iter;

/// Sequences at least this long get the popular-element heuristic
const POPULAR_MIN_LEN: usize = 200;

/// Which algorithm computes the edit operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Matcher {
    /// Longest matching block first, then recurse on both sides of it
    #[default]
    Blocks,
    Myers,
    Patience,
    Lcs,
}

/// Compute in-order edit operations turning `old` into `new` by repeatedly
/// taking the longest matching block.
///
/// Elements of `new` that make up more than 1% of a long sequence are never
/// used to start a match, which keeps noise such as spaces and newlines from
/// anchoring the alignment.
pub fn block_opcodes<T: Eq + Hash>(old: &[T], new: &[T]) -> Vec<DiffOp> {
    BlockMatcher::new(old, new).opcodes()
}

struct BlockMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// Positions in `b` of every non-popular element
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> BlockMatcher<'a, T> {
    fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<&T, Vec<usize>> = HashMap::new();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(elt).or_default().push(j);
        }
        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }
        Self { a, b, b2j }
    }

    /// Longest block with `a[i..i+k] == b[j..j+k]` inside the window,
    /// earliest in `a` (then earliest in `b`) on ties.
    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        // Length of the match ending at a[i - 1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Popular elements never seed a match but may still extend one.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    fn matching_blocks(&self) -> Vec<(usize, usize, usize)> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            blocks.push((i, j, k));
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        blocks.sort_unstable();

        let mut merged: Vec<(usize, usize, usize)> = Vec::with_capacity(blocks.len());
        for (i, j, k) in blocks {
            if let Some(last) = merged.last_mut() {
                if last.0 + last.2 == i && last.1 + last.2 == j {
                    last.2 += k;
                    continue;
                }
            }
            merged.push((i, j, k));
        }
        merged
    }

    fn opcodes(&self) -> Vec<DiffOp> {
        let sentinel = (self.a.len(), self.b.len(), 0);
        let mut ops = Vec::new();
        let (mut i, mut j) = (0, 0);
        for (ai, bj, size) in self.matching_blocks().into_iter().chain(iter::once(sentinel)) {
            match (i < ai, j < bj) {
                (true, true) => ops.push(DiffOp::Replace {
                    old_index: i,
                    old_len: ai - i,
                    new_index: j,
                    new_len: bj - j,
                }),
                (true, false) => ops.push(DiffOp::Delete {
                    old_index: i,
                    old_len: ai - i,
                    new_index: j,
                }),
                (false, true) => ops.push(DiffOp::Insert {
                    old_index: i,
                    new_index: j,
                    new_len: bj - j,
                }),
                (false, false) => {}
            }
            if size > 0 {
                ops.push(DiffOp::Equal {
                    old_index: ai,
                    new_index: bj,
                    len: size,
                });
            }
            i = ai + size;
            j = bj + size;
        }
        ops
    }
}

/// Roles used on the removed and the added side for one kind of operation
pub fn roles_for(tag: DiffTag) -> (Option<Role>, Option<Role>) {
    match tag {
        DiffTag::Equal => (Some(Role::DeletedUnchanged), Some(Role::InsertedUnchanged)),
        DiffTag::Delete => (Some(Role::DeletedChanged), None),
        DiffTag::Insert => (None, Some(Role::InsertedChanged)),
        DiffTag::Replace => (Some(Role::DeletedChanged), Some(Role::InsertedChanged)),
    }
}

/// Styled output for both sides of an aligned pair of blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aligned {
    pub removed: Vec<u8>,
    pub added: Vec<u8>,
}

/// Computes edit operations between token sequences and renders them
#[derive(Debug, Clone, Copy, Default)]
pub struct Aligner {
    matcher: Matcher,
    palette: Palette,
}

impl Aligner {
    pub fn new(matcher: Matcher, palette: Palette) -> Self {
        Self { matcher, palette }
    }

    pub fn matcher(&self) -> Matcher {
        self.matcher
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Edit operations covering both sequences exactly once, in order.
    /// No operation is empty on both sides.
    pub fn opcodes(&self, old: &[Token<'_>], new: &[Token<'_>]) -> Vec<DiffOp> {
        let ops = match self.matcher {
            Matcher::Blocks => block_opcodes(old, new),
            Matcher::Myers => capture_diff_slices(Algorithm::Myers, old, new),
            Matcher::Patience => capture_diff_slices(Algorithm::Patience, old, new),
            Matcher::Lcs => capture_diff_slices(Algorithm::Lcs, old, new),
        };
        // The LCS backend reports a zero-length delete for two empty inputs.
        ops.into_iter()
            .filter(|op| {
                let (_, old_range, new_range) = op.as_tag_tuple();
                !(old_range.is_empty() && new_range.is_empty())
            })
            .collect()
    }

    /// Render both sides, coloring each token by what happened to it.
    ///
    /// Tokens common to both sides are kept in both outputs with the dim
    /// "unchanged" roles. Both outputs end with a reset.
    pub fn align(&self, old: &[Token<'_>], new: &[Token<'_>]) -> Aligned {
        let ops = self.opcodes(old, new);
        log::trace!(
            "aligning {} removed and {} added tokens in {} ops",
            old.len(),
            new.len(),
            ops.len()
        );

        let mut aligned = Aligned::default();
        for op in &ops {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            let (removed_role, added_role) = roles_for(tag);
            if let Some(role) = removed_role {
                self.paint_into(&mut aligned.removed, role, &old[old_range]);
            }
            if let Some(role) = added_role {
                self.paint_into(&mut aligned.added, role, &new[new_range]);
            }
        }
        aligned.removed.extend_from_slice(RESET.as_bytes());
        aligned.added.extend_from_slice(RESET.as_bytes());
        aligned
    }

    /// Render a single side with one role, followed by a reset
    pub fn paint(&self, role: Role, tokens: &[Token<'_>]) -> Vec<u8> {
        let mut out = Vec::new();
        self.paint_into(&mut out, role, tokens);
        out.extend_from_slice(RESET.as_bytes());
        out
    }

    fn paint_into(&self, out: &mut Vec<u8>, role: Role, tokens: &[Token<'_>]) {
        let style = self.palette.style(role);
        let text = style.text_escape();
        out.extend_from_slice(text.as_bytes());
        for token in tokens {
            match token.split_line_end() {
                Some((spaces, terminator)) => {
                    out.extend_from_slice(style.trailing_space_escape().as_bytes());
                    out.extend_from_slice(spaces);
                    out.extend_from_slice(RESET.as_bytes());
                    out.extend_from_slice(terminator);
                    out.extend_from_slice(text.as_bytes());
                }
                None => out.extend_from_slice(token.text()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;
    use regex::bytes::Regex;

    const ALL_MATCHERS: [Matcher; 4] = [
        Matcher::Blocks,
        Matcher::Myers,
        Matcher::Patience,
        Matcher::Lcs,
    ];

    fn strip_ansi(bytes: &[u8]) -> Vec<u8> {
        let re = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
        re.replace_all(bytes, &b""[..]).into_owned()
    }

    fn tuples(ops: &[DiffOp]) -> Vec<(DiffTag, (usize, usize), (usize, usize))> {
        ops.iter()
            .map(|op| {
                let (tag, o, n) = op.as_tag_tuple();
                (tag, (o.start, o.end), (n.start, n.end))
            })
            .collect()
    }

    /// Every index on both sides is covered by exactly one op, in order
    fn assert_partition(ops: &[DiffOp], old_len: usize, new_len: usize) {
        let (mut old_pos, mut new_pos) = (0, 0);
        for op in ops {
            let (tag, o, n) = op.as_tag_tuple();
            assert_eq!(o.start, old_pos, "gap or overlap on old side at {:?}", op);
            assert_eq!(n.start, new_pos, "gap or overlap on new side at {:?}", op);
            match tag {
                DiffTag::Equal => assert_eq!(o.len(), n.len()),
                DiffTag::Delete => assert!(n.is_empty() && !o.is_empty()),
                DiffTag::Insert => assert!(o.is_empty() && !n.is_empty()),
                DiffTag::Replace => assert!(!o.is_empty() && !n.is_empty()),
            }
            old_pos = o.end;
            new_pos = n.end;
        }
        assert_eq!(old_pos, old_len);
        assert_eq!(new_pos, new_len);
    }

    #[test]
    fn test_block_opcodes_classic_example() {
        let a: Vec<char> = "qabxcd".chars().collect();
        let b: Vec<char> = "abycdf".chars().collect();
        assert_eq!(
            tuples(&block_opcodes(&a, &b)),
            vec![
                (DiffTag::Delete, (0, 1), (0, 0)),
                (DiffTag::Equal, (1, 3), (0, 2)),
                (DiffTag::Replace, (3, 4), (2, 3)),
                (DiffTag::Equal, (4, 6), (3, 5)),
                (DiffTag::Insert, (6, 6), (5, 6)),
            ]
        );
    }

    #[test]
    fn test_longest_match_prefers_earliest_in_old() {
        let a: Vec<char> = " abcd".chars().collect();
        let b: Vec<char> = "abcd abcd".chars().collect();
        let matcher = BlockMatcher::new(&a, &b);
        assert_eq!(matcher.find_longest_match(0, 5, 0, 9), (0, 4, 5));
    }

    #[test]
    fn test_adjacent_blocks_are_merged() {
        let a: Vec<char> = "abcdef".chars().collect();
        let ops = block_opcodes(&a, &a);
        assert_eq!(tuples(&ops), vec![(DiffTag::Equal, (0, 6), (0, 6))]);
    }

    #[test]
    fn test_popular_elements_do_not_seed_matches() {
        let a = vec!["y", "x"];
        let mut b = vec!["x"; POPULAR_MIN_LEN];
        b.insert(0, "z");
        assert_eq!(
            tuples(&block_opcodes(&a, &b)),
            vec![(DiffTag::Replace, (0, 2), (0, POPULAR_MIN_LEN + 1))]
        );
    }

    #[test]
    fn test_popular_element_at_window_edge_still_matches() {
        let a = vec!["x"];
        let b = vec!["x"; POPULAR_MIN_LEN];
        assert_eq!(
            tuples(&block_opcodes(&a, &b)),
            vec![
                (DiffTag::Equal, (0, 1), (0, 1)),
                (DiffTag::Insert, (1, 1), (1, POPULAR_MIN_LEN)),
            ]
        );
    }

    #[test]
    fn test_popular_elements_extend_matches() {
        let mut b = vec!["x"; POPULAR_MIN_LEN];
        b.insert(0, "anchor");
        let a = vec!["anchor", "x", "x"];
        let ops = block_opcodes(&a, &b);
        assert_eq!(
            tuples(&ops),
            vec![
                (DiffTag::Equal, (0, 3), (0, 3)),
                (DiffTag::Insert, (3, 3), (3, POPULAR_MIN_LEN + 1)),
            ]
        );
    }

    #[test]
    fn test_opcodes_partition_both_sides() {
        let pairs: [(&[u8], &[u8]); 6] = [
            (b"-foo bar baz\n", b"+foo qux baz\n"),
            (b"-a\n-b\n", b"+c\n+d\n"),
            (b"", b"+only added\n"),
            (b"-only removed\n", b""),
            (b"", b""),
            (b"-x = 1;  \n-y = 2;\n", b"+x = 10;\n+z = 2;\n+w\n"),
        ];
        for matcher in ALL_MATCHERS {
            let aligner = Aligner::new(matcher, Palette::default());
            for (old, new) in pairs {
                let old_tokens = tokenize(old);
                let new_tokens = tokenize(new);
                let ops = aligner.opcodes(&old_tokens, &new_tokens);
                assert_partition(&ops, old_tokens.len(), new_tokens.len());
            }
        }
    }

    #[test]
    fn test_empty_inputs_give_no_ops() {
        for matcher in ALL_MATCHERS {
            let aligner = Aligner::new(matcher, Palette::default());
            assert!(aligner.opcodes(&[], &[]).is_empty(), "{:?}", matcher);
            let aligned = aligner.align(&[], &[]);
            assert_eq!(aligned.removed, RESET.as_bytes());
            assert_eq!(aligned.added, RESET.as_bytes());
        }
    }

    #[test]
    fn test_every_op_kind_has_roles() {
        for tag in [
            DiffTag::Equal,
            DiffTag::Delete,
            DiffTag::Insert,
            DiffTag::Replace,
        ] {
            let (removed, added) = roles_for(tag);
            assert!(removed.is_some() || added.is_some(), "{:?} renders nothing", tag);
        }
        assert_eq!(
            roles_for(DiffTag::Equal),
            (Some(Role::DeletedUnchanged), Some(Role::InsertedUnchanged))
        );
        assert_eq!(
            roles_for(DiffTag::Replace),
            (Some(Role::DeletedChanged), Some(Role::InsertedChanged))
        );
    }

    #[test]
    fn test_stripped_output_preserves_text() {
        let old: &[u8] = b"-let total = a + b;  \n-return total;\n";
        let new: &[u8] = b"+let sum = a + b;\n+return sum;\n";
        for matcher in ALL_MATCHERS {
            let aligner = Aligner::new(matcher, Palette::default());
            let aligned = aligner.align(&tokenize(old), &tokenize(new));
            assert_eq!(strip_ansi(&aligned.removed), old);
            assert_eq!(strip_ansi(&aligned.added), new);
        }
    }

    #[test]
    fn test_equal_tokens_appear_on_both_sides() {
        let aligner = Aligner::default();
        let palette = *aligner.palette();
        let old = tokenize(b"-foo bar\n");
        let new = tokenize(b"+foo baz\n");
        let aligned = aligner.align(&old, &new);

        let removed = String::from_utf8(aligned.removed).unwrap();
        let added = String::from_utf8(aligned.added).unwrap();
        let dim_del = palette.style(Role::DeletedUnchanged).text_escape();
        let dim_ins = palette.style(Role::InsertedUnchanged).text_escape();
        let bold_del = palette.style(Role::DeletedChanged).text_escape();
        let bold_ins = palette.style(Role::InsertedChanged).text_escape();

        assert!(removed.contains(&format!("{dim_del}foo ")));
        assert!(added.contains(&format!("{dim_ins}foo ")));
        assert!(removed.contains(&format!("{bold_del}bar")));
        assert!(added.contains(&format!("{bold_ins}baz")));
        assert!(removed.ends_with(RESET));
        assert!(added.ends_with(RESET));
    }

    #[test]
    fn test_trailing_space_rendering() {
        let aligner = Aligner::default();
        let palette = *aligner.palette();
        let old = tokenize(b"foo  \n");
        let new = tokenize(b"foo\n");
        let aligned = aligner.align(&old, &new);

        let dim = palette.style(Role::DeletedUnchanged);
        let bold = palette.style(Role::DeletedChanged);
        let expected = format!(
            "{}foo{}{}  {RESET}\n{}{RESET}",
            dim.text_escape(),
            bold.text_escape(),
            bold.trailing_space_escape(),
            bold.text_escape(),
        );
        assert_eq!(String::from_utf8(aligned.removed).unwrap(), expected);
    }

    #[test]
    fn test_empty_side_degenerates_to_single_op() {
        let aligner = Aligner::default();
        let palette = *aligner.palette();
        let new = tokenize(b"+x\n");
        let aligned = aligner.align(&[], &new);

        let style = palette.style(Role::InsertedChanged);
        assert_eq!(aligned.removed, RESET.as_bytes());
        assert_eq!(
            String::from_utf8(aligned.added).unwrap(),
            format!(
                "{}+x{}{RESET}\n{}{RESET}",
                style.text_escape(),
                style.trailing_space_escape(),
                style.text_escape()
            )
        );
    }

    #[test]
    fn test_paint_single_side() {
        let aligner = Aligner::default();
        let style = aligner.palette().style(Role::DeletedChanged);
        let out = aligner.paint(Role::DeletedChanged, &tokenize(b"-gone"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}-gone{RESET}", style.text_escape())
        );
    }

    #[test]
    fn test_identical_blocks_are_all_unchanged() {
        let aligner = Aligner::default();
        let tokens = tokenize(b"same line\n");
        let ops = aligner.opcodes(&tokens, &tokens);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].tag(), DiffTag::Equal);
    }
}
