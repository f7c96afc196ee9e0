//! Sorted, non-overlapping range sets.
//!
//! Every exclusion query in the scanner and collector goes through here, so
//! lookups are binary searches over the sorted ranges.

use crate::error::TextRange;

/// An ordered set of disjoint, non-empty ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<TextRange>,
}

impl RangeSet {
    pub fn new() -> Self {
        RangeSet { ranges: Vec::new() }
    }

    /// Build a set from arbitrary ranges: sorts, drops empty ranges and
    /// coalesces overlapping or touching ones.
    pub fn from_ranges<I: IntoIterator<Item = TextRange>>(ranges: I) -> Self {
        let mut ranges: Vec<TextRange> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        ranges.sort_unstable();
        let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
        for r in ranges {
            match merged.last_mut() {
                Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
                _ => merged.push(r),
            }
        }
        RangeSet { ranges: merged }
    }

    pub fn as_slice(&self) -> &[TextRange] {
        &self.ranges
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextRange> + '_ {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Index of the first range whose end lies after `offset`.
    fn first_ending_after(&self, offset: usize) -> usize {
        self.ranges.partition_point(|r| r.end <= offset)
    }

    /// The range containing `offset`, if any.
    pub fn range_at(&self, offset: usize) -> Option<TextRange> {
        let idx = self.first_ending_after(offset);
        self.ranges
            .get(idx)
            .copied()
            .filter(|r| r.start <= offset)
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.range_at(offset).is_some()
    }

    /// Check if any member shares an offset with `range`. An empty `range`
    /// is treated as the single point `range.start`.
    pub fn intersects(&self, range: &TextRange) -> bool {
        if range.is_empty() {
            return self.contains(range.start);
        }
        let idx = self.first_ending_after(range.start);
        matches!(self.ranges.get(idx), Some(r) if r.start < range.end)
    }

    /// Check if `range` lies entirely inside a single member.
    pub fn covers(&self, range: &TextRange) -> bool {
        matches!(self.range_at(range.start), Some(r) if range.end <= r.end)
    }

    pub fn union(&self, other: &RangeSet) -> RangeSet {
        RangeSet::from_ranges(self.ranges.iter().chain(other.ranges.iter()).copied())
    }

    /// Remove every offset covered by `other`.
    pub fn subtract(&self, other: &RangeSet) -> RangeSet {
        let mut out = Vec::with_capacity(self.ranges.len());
        let mut holes = other.ranges.iter().peekable();
        for r in &self.ranges {
            let mut start = r.start;
            while let Some(h) = holes.peek() {
                if h.end <= start {
                    holes.next();
                    continue;
                }
                if h.start >= r.end {
                    break;
                }
                if h.start > start {
                    out.push(TextRange::new(start, h.start));
                }
                start = start.max(h.end);
                if h.end > r.end {
                    break;
                }
                holes.next();
            }
            if start < r.end {
                out.push(TextRange::new(start, r.end));
            }
        }
        RangeSet { ranges: out }
    }
}

impl FromIterator<TextRange> for RangeSet {
    fn from_iter<I: IntoIterator<Item = TextRange>>(iter: I) -> Self {
        RangeSet::from_ranges(iter)
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a TextRange;
    type IntoIter = std::slice::Iter<'a, TextRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
