use std::fmt;

/// A half-open `[start, end)` range of byte offsets into a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    /// Create a range with explicit start and end.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted range {start}..{end}");
        TextRange { start, end }
    }

    /// Create an empty range positioned at `offset`.
    pub fn empty(offset: usize) -> Self {
        TextRange {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// `start <= offset < end`.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// `start <= offset <= end`. Scopes use this so a cursor sitting right
    /// before the closing bracket still counts as inside.
    pub fn contains_inclusive(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Check if `other` is fully contained within `self`.
    pub fn contains_range(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if the two ranges share at least one offset. An empty range
    /// holds no offsets, so it intersects nothing.
    pub fn intersects(&self, other: &TextRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Smallest range covering both `self` and `other`.
    pub fn cover(self, other: TextRange) -> TextRange {
        TextRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slice the document text covered by this range.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unknown exclusion mode `{0}`")]
    UnknownExcludeMode(String),

    #[error("offset {offset} is outside the document (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("position {line}:{character} is outside the document")]
    PositionOutOfRange { line: u32, character: u32 },
}

impl Error {
    /// A short hint for user-facing messages, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::UnknownExcludeMode(_) => Some(
                "expected one of: none, comment-string, comment-string-quote, \
                 comment-string-backquote, comment-string-quote-backquote, \
                 comment-string-quote-backquote-except-comma",
            ),
            _ => None,
        }
    }
}
