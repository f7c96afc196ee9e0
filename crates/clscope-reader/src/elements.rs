//! Bracket-bounded element reader.
//!
//! Walks the top-level elements between two offsets without re-lexing
//! nested content: a bracketed element is skipped in one step through the
//! pair index, strings and comments through the scanner's ranges.

use clscope_core::TextRange;

use crate::chars::{atom_end, is_whitespace};
use crate::pairs::Pair;
use crate::scanner::Scanned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Group(Pair),
    Atom,
    Str,
}

/// One datum inside a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    /// The datum itself, without reader prefixes.
    pub range: TextRange,
    /// Start of the element including prefixes such as `'` or `#'`.
    pub start: usize,
    /// Preceded by `'` or `` ` ``.
    pub quoted: bool,
}

impl Element {
    pub fn group(&self) -> Option<Pair> {
        match self.kind {
            ElementKind::Group(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn is_atom(&self) -> bool {
        self.kind == ElementKind::Atom
    }

    pub fn is_string(&self) -> bool {
        self.kind == ElementKind::Str
    }

    /// Offset just past the element.
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// The element's source text.
    pub fn text<'t>(&self, text: &'t str) -> &'t str {
        self.range.slice(text)
    }
}

/// Iterator over the elements in `[pos, end)`. Feature expressions
/// (`#+sbcl form`, `#-(or a b) form`) are skipped together with the form
/// they guard. Iteration stops at the first unmatched opening bracket.
#[derive(Clone)]
pub struct Elements<'a> {
    bytes: &'a [u8],
    scanned: &'a Scanned,
    pos: usize,
    end: usize,
}

impl<'a> Elements<'a> {
    pub fn new(text: &'a str, scanned: &'a Scanned, pos: usize, end: usize) -> Self {
        Elements {
            bytes: text.as_bytes(),
            scanned,
            pos,
            end: end.min(text.len()),
        }
    }

    fn byte(&self, at: usize) -> Option<u8> {
        if at < self.end {
            Some(self.bytes[at])
        } else {
            None
        }
    }

    fn skip_trivia(&mut self) {
        while self.pos < self.end {
            if is_whitespace(self.bytes[self.pos]) {
                self.pos += 1;
            } else if let Some(comment) = self.scanned.comments.range_at(self.pos) {
                self.pos = comment.end;
            } else {
                break;
            }
        }
    }

    /// Read one element, reporting feature expressions as such.
    fn read(&mut self) -> Option<Read> {
        loop {
            self.skip_trivia();
            if self.pos >= self.end {
                return None;
            }
            let start = self.pos;
            let mut quoted = false;
            loop {
                match self.byte(self.pos) {
                    Some(b'\'' | b'`') => {
                        quoted = true;
                        self.pos += 1;
                    }
                    Some(b',') => {
                        self.pos += 1;
                        if matches!(self.byte(self.pos), Some(b'@' | b'.')) {
                            self.pos += 1;
                        }
                    }
                    Some(b'#') if self.byte(self.pos + 1) == Some(b'\'') => self.pos += 2,
                    _ => break,
                }
            }
            let Some(b) = self.byte(self.pos) else {
                return None;
            };
            match b {
                b'#' if matches!(self.byte(self.pos + 1), Some(b'+' | b'-')) => {
                    self.pos += 2;
                    return Some(Read::Feature);
                }
                b'#' if self.byte(self.pos + 1) == Some(b'(') => {
                    self.pos += 1;
                    return self.group(start, quoted);
                }
                b'(' => return self.group(start, quoted),
                b')' => {
                    // Stray closer inside a bounded region.
                    self.pos += 1;
                    continue;
                }
                b'"' => {
                    let range = match self.scanned.strings.range_at(self.pos) {
                        Some(r) => TextRange::new(r.start, r.end.min(self.end)),
                        None => TextRange::new(self.pos, self.end),
                    };
                    self.pos = range.end;
                    return Some(Read::Element(Element {
                        kind: ElementKind::Str,
                        range,
                        start,
                        quoted,
                    }));
                }
                _ => {
                    let atom_start = self.pos;
                    let stop = atom_end(self.bytes, atom_start).min(self.end);
                    self.pos = stop.max(atom_start + 1);
                    if stop == atom_start {
                        continue;
                    }
                    return Some(Read::Element(Element {
                        kind: ElementKind::Atom,
                        range: TextRange::new(atom_start, stop),
                        start,
                        quoted,
                    }));
                }
            }
        }
    }

    fn group(&mut self, start: usize, quoted: bool) -> Option<Read> {
        let open = self.pos;
        let close = self.scanned.pairs.close_of(open)?;
        if close >= self.end {
            return None;
        }
        self.pos = close + 1;
        let pair = Pair { open, close };
        Some(Read::Element(Element {
            kind: ElementKind::Group(pair),
            range: pair.range(),
            start,
            quoted,
        }))
    }
}

enum Read {
    Element(Element),
    Feature,
}

impl Iterator for Elements<'_> {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        loop {
            match self.read()? {
                Read::Element(element) => return Some(element),
                Read::Feature => {
                    // Skip the feature test, then the guarded form.
                    self.read()?;
                    self.read()?;
                }
            }
        }
    }
}
