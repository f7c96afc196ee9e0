//! Structural scanner.
//!
//! One left-to-right pass over the document that records bracket pairs,
//! comments, strings and the extent of quoted, backquoted and comma-escaped
//! data. Nothing here fails: an unterminated string, block comment or
//! `|...|` name is recorded up to the end of the text and the scan stops
//! there, so no structure is reported past the damage.

use std::sync::OnceLock;

use clscope_core::{ExcludeMode, RangeSet, TextRange};

use crate::chars::{atom_end, is_marker_char};
use crate::elements::Elements;
use crate::pairs::{Pair, PairIndex};

/// Ranges introduced by one kind of quote marker, split by what follows the
/// marker. Ranges start at the marker and may nest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteRanges {
    /// Marker followed by a bracketed form: `'(a b)`.
    pub forms: Vec<TextRange>,
    /// Marker followed by a bare atom: `'a`.
    pub atoms: Vec<TextRange>,
}

impl QuoteRanges {
    /// Forms and atoms merged into one set.
    pub fn all(&self) -> RangeSet {
        RangeSet::from_ranges(self.forms.iter().chain(self.atoms.iter()).copied())
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty() && self.atoms.is_empty()
    }
}

/// Result of scanning one document.
#[derive(Debug, Default)]
pub struct Scanned {
    text_len: usize,
    pub pairs: PairIndex,
    pub comments: RangeSet,
    pub strings: RangeSet,
    pub quote: QuoteRanges,
    pub backquote: QuoteRanges,
    pub comma: QuoteRanges,
    /// Offset where scanning stopped early, if it did.
    pub truncated_at: Option<usize>,
    comment_string: OnceLock<RangeSet>,
    quoted_context: OnceLock<RangeSet>,
    excluded: [OnceLock<RangeSet>; 6],
}

impl Scanned {
    /// Length of the scanned text in bytes.
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// Comments and strings merged.
    pub fn comment_string(&self) -> &RangeSet {
        self.comment_string
            .get_or_init(|| self.comments.union(&self.strings))
    }

    pub fn in_comment_or_string(&self, offset: usize) -> bool {
        self.comment_string().contains(offset)
    }

    /// Quoted or backquoted data, minus comma-escaped parts. Symbols in here
    /// are not evaluated in place.
    pub fn quoted_context(&self) -> &RangeSet {
        self.quoted_context
            .get_or_init(|| self.quoted_layers(true, true, true))
    }

    /// Ranges removed from analysis under `mode`.
    pub fn excluded(&self, mode: ExcludeMode) -> &RangeSet {
        let slot = ExcludeMode::ALL
            .iter()
            .position(|m| *m == mode)
            .unwrap_or_default();
        self.excluded[slot].get_or_init(|| {
            let quoted = self.quoted_layers(
                mode.excludes_quote(),
                mode.excludes_backquote(),
                mode.keeps_comma(),
            );
            if mode.excludes_comments_and_strings() {
                quoted.union(self.comment_string())
            } else {
                quoted
            }
        })
    }

    /// Quoted extent with nesting respected. Marker ranges nest, and the
    /// innermost one decides: a comma turns its extent back into code, and a
    /// quote inside that comma makes data again, as in `` `(a ,(f '(b))) ``.
    fn quoted_layers(&self, quote: bool, backquote: bool, comma: bool) -> RangeSet {
        let mut layers: Vec<(TextRange, bool)> = Vec::new();
        for (ranges, enabled, quoted) in [
            (&self.quote, quote, true),
            (&self.backquote, backquote, true),
            (&self.comma, comma, false),
        ] {
            if enabled {
                layers.extend(ranges.forms.iter().chain(&ranges.atoms).map(|r| (*r, quoted)));
            }
        }
        // Outermost first.
        layers.sort_by(|(a, _), (b, _)| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut out = Vec::new();
        let mut open: Vec<(usize, bool)> = Vec::new();
        let mut cursor = 0;
        for (range, quoted) in layers {
            while let Some(&(end, q)) = open.last() {
                if end > range.start {
                    break;
                }
                if q && cursor < end {
                    out.push(TextRange::new(cursor, end));
                }
                cursor = end;
                open.pop();
            }
            let end = match open.last() {
                Some(&(parent_end, q)) => {
                    if q && cursor < range.start {
                        out.push(TextRange::new(cursor, range.start));
                    }
                    range.end.min(parent_end)
                }
                None => range.end,
            };
            cursor = range.start;
            open.push((end, quoted));
        }
        while let Some((end, q)) = open.pop() {
            if q && cursor < end {
                out.push(TextRange::new(cursor, end));
            }
            cursor = cursor.max(end);
        }
        RangeSet::from_ranges(out)
    }

    /// Iterate the top-level elements inside `pair`.
    pub fn elements<'a>(&'a self, text: &'a str, pair: Pair) -> Elements<'a> {
        Elements::new(text, self, pair.open + 1, pair.close)
    }
}

#[derive(Debug, Clone, Copy)]
enum QuoteKind {
    Quote,
    Backquote,
    Comma,
}

/// A marker waiting for its bracketed form to close.
#[derive(Debug)]
struct PendingQuote {
    kind: QuoteKind,
    start: usize,
    depth: usize,
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    stack: Vec<usize>,
    pairs: Vec<Pair>,
    comments: Vec<TextRange>,
    strings: Vec<TextRange>,
    pending: Vec<PendingQuote>,
    quote: QuoteRanges,
    backquote: QuoteRanges,
    comma: QuoteRanges,
    truncated_at: Option<usize>,
}

/// Scan `text` into a bracket-pair index and exclusion ranges.
pub fn scan(text: &str) -> Scanned {
    let mut scanner = Scanner {
        bytes: text.as_bytes(),
        pos: 0,
        stack: Vec::new(),
        pairs: Vec::new(),
        comments: Vec::new(),
        strings: Vec::new(),
        pending: Vec::new(),
        quote: QuoteRanges::default(),
        backquote: QuoteRanges::default(),
        comma: QuoteRanges::default(),
        truncated_at: None,
    };
    scanner.run();
    scanner.finish()
}

impl<'a> Scanner<'a> {
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn run(&mut self) {
        let len = self.bytes.len();
        while self.pos < len {
            let start = self.pos;
            match self.bytes[start] {
                b';' => {
                    let end = self.bytes[start..]
                        .iter()
                        .position(|&b| b == b'\n')
                        .map_or(len, |n| start + n);
                    self.comments.push(TextRange::new(start, end));
                    self.pos = end;
                }
                b'"' => {
                    if !self.string(start) {
                        return;
                    }
                }
                b'#' => match self.peek(1) {
                    Some(b'|') => {
                        if !self.block_comment(start) {
                            return;
                        }
                    }
                    Some(b'\\') => self.pos = atom_end(self.bytes, start),
                    Some(b'\'') => self.pos += 2,
                    _ => self.pos += 1,
                },
                b'|' => {
                    self.pos += 1;
                    while self.pos < len && self.bytes[self.pos] != b'|' {
                        self.pos += if self.bytes[self.pos] == b'\\' { 2 } else { 1 };
                    }
                    if self.pos >= len {
                        self.truncated_at = Some(start);
                        return;
                    }
                    self.pos += 1;
                }
                b'\\' => self.pos += 2,
                b'(' => {
                    self.stack.push(start);
                    self.pos += 1;
                }
                b')' => {
                    // Unmatched closing brackets are ignored.
                    if let Some(open) = self.stack.pop() {
                        self.pairs.push(Pair { open, close: start });
                        self.close_quotes(start);
                    }
                    self.pos += 1;
                }
                b'\'' => self.marker(QuoteKind::Quote, 1),
                b'`' => self.marker(QuoteKind::Backquote, 1),
                b',' => {
                    let width = if matches!(self.peek(1), Some(b'@' | b'.')) { 2 } else { 1 };
                    self.marker(QuoteKind::Comma, width);
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Scan a string starting at `start`. Returns `false` if unterminated.
    fn string(&mut self, start: usize) -> bool {
        let len = self.bytes.len();
        let mut i = start + 1;
        while i < len {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    self.strings.push(TextRange::new(start, i + 1));
                    self.pos = i + 1;
                    return true;
                }
                _ => i += 1,
            }
        }
        self.strings.push(TextRange::new(start, len));
        self.truncated_at = Some(start);
        self.pos = len;
        false
    }

    /// Scan a nestable `#| ... |#` comment. Returns `false` if unterminated.
    fn block_comment(&mut self, start: usize) -> bool {
        let len = self.bytes.len();
        let mut depth = 1usize;
        let mut i = start + 2;
        while i + 1 < len {
            match (self.bytes[i], self.bytes[i + 1]) {
                (b'|', b'#') => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        self.comments.push(TextRange::new(start, i));
                        self.pos = i;
                        return true;
                    }
                }
                (b'#', b'|') => {
                    depth += 1;
                    i += 2;
                }
                _ => i += 1,
            }
        }
        self.comments.push(TextRange::new(start, len));
        self.truncated_at = Some(start);
        self.pos = len;
        false
    }

    /// Record a quote-family marker of `width` bytes at the current position.
    /// Looks past further marker characters to decide whether the datum is a
    /// bracketed form or a bare atom; the marker itself is consumed alone so
    /// stacked markers each get their own range.
    fn marker(&mut self, kind: QuoteKind, width: usize) {
        let start = self.pos;
        let len = self.bytes.len();
        let mut j = start + width;
        while j < len && is_marker_char(self.bytes[j]) {
            // `#\` starts a character atom, not another marker.
            if self.bytes[j] == b'#' && self.bytes.get(j + 1) == Some(&b'\\') {
                break;
            }
            j += 1;
        }
        if j < len && self.bytes[j] == b'(' {
            self.pending.push(PendingQuote {
                kind,
                start,
                depth: self.stack.len(),
            });
        } else if j < len && !matches!(self.bytes[j], b')' | b'"' | b';') {
            let end = atom_end(self.bytes, j);
            if end > j {
                self.ranges_mut(kind).atoms.push(TextRange::new(start, end));
            }
        }
        self.pos = start + width;
    }

    /// A pair just closed at `close`; finish markers whose form it was.
    fn close_quotes(&mut self, close: usize) {
        let depth = self.stack.len();
        while matches!(self.pending.last(), Some(p) if p.depth == depth) {
            if let Some(p) = self.pending.pop() {
                self.ranges_mut(p.kind)
                    .forms
                    .push(TextRange::new(p.start, close + 1));
            }
        }
    }

    fn ranges_mut(&mut self, kind: QuoteKind) -> &mut QuoteRanges {
        match kind {
            QuoteKind::Quote => &mut self.quote,
            QuoteKind::Backquote => &mut self.backquote,
            QuoteKind::Comma => &mut self.comma,
        }
    }

    fn finish(mut self) -> Scanned {
        for ranges in [&mut self.quote, &mut self.backquote, &mut self.comma] {
            ranges.forms.sort_unstable();
            ranges.atoms.sort_unstable();
        }
        Scanned {
            text_len: self.bytes.len(),
            pairs: PairIndex::from_pairs(self.pairs),
            comments: RangeSet::from_ranges(self.comments),
            strings: RangeSet::from_ranges(self.strings),
            quote: self.quote,
            backquote: self.backquote,
            comma: self.comma,
            truncated_at: self.truncated_at,
            ..Scanned::default()
        }
    }
}
