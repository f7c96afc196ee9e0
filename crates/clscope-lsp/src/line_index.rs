//! Byte offsets ↔ LSP positions.
//!
//! Analysis works on byte offsets; the protocol counts lines and UTF-16
//! code units. A `LineIndex` is built once per document version.

use clscope_core::{Error, TextRange};
use tower_lsp::lsp_types::{Position, Range};

#[derive(Debug, Clone)]
pub struct LineIndex<'t> {
    text: &'t str,
    /// Byte offset of the first character of each line.
    line_starts: Vec<usize>,
}

impl<'t> LineIndex<'t> {
    pub fn new(text: &'t str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The zero-based line holding `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .binary_search(&offset)
            .unwrap_or_else(|next| next.saturating_sub(1))
    }

    /// Text of `line` without its terminator.
    fn line_text(&self, line: usize) -> Option<&'t str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        let raw = self.text.get(start..end)?;
        Some(raw.strip_suffix('\r').unwrap_or(raw))
    }

    /// Offsets past the end clamp to the end of the document.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.line_of(offset);
        let start = self.line_starts[line];
        let character = self
            .text
            .get(start..offset)
            .map_or(0, |s| s.encode_utf16().count());
        Position {
            line: line as u32,
            character: character as u32,
        }
    }

    pub fn range(&self, range: TextRange) -> Range {
        Range {
            start: self.position(range.start),
            end: self.position(range.end),
        }
    }

    /// Byte offset of `position`. A character past the end of its line
    /// clamps to the line end; a line past the end of the document is an
    /// error.
    pub fn offset(&self, position: Position) -> Result<usize, Error> {
        let line = position.line as usize;
        let text = self.line_text(line).ok_or(Error::PositionOutOfRange {
            line: position.line,
            character: position.character,
        })?;
        Ok(self.line_starts[line] + utf16_to_byte_offset(text, position.character))
    }

    /// Length of `range` in UTF-16 code units.
    pub fn utf16_len(&self, range: TextRange) -> u32 {
        self.text
            .get(range.start..range.end)
            .map_or(0, |s| s.encode_utf16().count() as u32)
    }
}

/// Convert a 0-indexed LSP UTF-16 character offset to a byte offset in a UTF-8 string.
/// Returns the byte offset, clamped to the string length.
pub fn utf16_to_byte_offset(line: &str, utf16_offset: u32) -> usize {
    let mut utf16_count = 0u32;
    for (byte_idx, ch) in line.char_indices() {
        if utf16_count >= utf16_offset {
            return byte_idx;
        }
        utf16_count += ch.len_utf16() as u32;
    }
    line.len()
}
