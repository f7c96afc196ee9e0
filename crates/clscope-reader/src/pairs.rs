//! Bracket-pair index.
//!
//! Maps every well-nested `(`/`)` pair in both directions. Unmatched
//! brackets never appear. Pairs are also kept sorted by opening offset with
//! parent links, which answers "innermost enclosing pair" and "direct
//! children" in logarithmic time.

use clscope_core::TextRange;
use hashbrown::HashMap;

/// One matched bracket pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    pub open: usize,
    pub close: usize,
}

impl Pair {
    /// The whole form, brackets included.
    pub fn range(&self) -> TextRange {
        TextRange::new(self.open, self.close + 1)
    }

    /// Everything between the brackets.
    pub fn inner(&self) -> TextRange {
        TextRange::new(self.open + 1, self.close)
    }

    /// Check if `other` is nested inside `self` (or equal to it).
    pub fn encloses(&self, other: &Pair) -> bool {
        self.open <= other.open && other.close <= self.close
    }
}

#[derive(Debug, Clone, Default)]
pub struct PairIndex {
    by_open: Vec<Pair>,
    parents: Vec<Option<usize>>,
    open_to_close: HashMap<usize, usize>,
    close_to_open: HashMap<usize, usize>,
}

impl PairIndex {
    /// Build an index from matched `(open, close)` offsets in any order.
    pub fn from_pairs(mut pairs: Vec<Pair>) -> Self {
        pairs.sort_unstable();
        let mut parents = Vec::with_capacity(pairs.len());
        let mut stack: Vec<usize> = Vec::new();
        for (idx, pair) in pairs.iter().enumerate() {
            while let Some(&top) = stack.last() {
                if pairs[top].close < pair.open {
                    stack.pop();
                } else {
                    break;
                }
            }
            parents.push(stack.last().copied());
            stack.push(idx);
        }
        let open_to_close = pairs.iter().map(|p| (p.open, p.close)).collect();
        let close_to_open = pairs.iter().map(|p| (p.close, p.open)).collect();
        PairIndex {
            by_open: pairs,
            parents,
            open_to_close,
            close_to_open,
        }
    }

    pub fn len(&self) -> usize {
        self.by_open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_open.is_empty()
    }

    /// All pairs sorted by opening offset.
    pub fn iter(&self) -> impl Iterator<Item = &Pair> + '_ {
        self.by_open.iter()
    }

    pub fn close_of(&self, open: usize) -> Option<usize> {
        self.open_to_close.get(&open).copied()
    }

    pub fn open_of(&self, close: usize) -> Option<usize> {
        self.close_to_open.get(&close).copied()
    }

    /// The pair whose opening bracket is at `open`.
    pub fn get(&self, open: usize) -> Option<Pair> {
        self.close_of(open).map(|close| Pair { open, close })
    }

    fn index_of(&self, open: usize) -> Option<usize> {
        self.by_open.binary_search_by_key(&open, |p| p.open).ok()
    }

    /// Pairs not nested in any other pair.
    pub fn top_level(&self) -> impl Iterator<Item = Pair> + '_ {
        self.by_open
            .iter()
            .zip(&self.parents)
            .filter(|(_, parent)| parent.is_none())
            .map(|(pair, _)| *pair)
    }

    /// The directly enclosing pair of the pair opening at `open`.
    pub fn parent(&self, open: usize) -> Option<Pair> {
        let idx = self.index_of(open)?;
        self.parents[idx].map(|p| self.by_open[p])
    }

    /// Innermost pair with `open <= offset <= close`.
    pub fn enclosing(&self, offset: usize) -> Option<Pair> {
        let upto = self.by_open.partition_point(|p| p.open <= offset);
        let mut idx = upto.checked_sub(1)?;
        loop {
            let pair = self.by_open[idx];
            if pair.close >= offset {
                return Some(pair);
            }
            idx = self.parents[idx]?;
        }
    }

    /// Outermost pair containing `offset`.
    pub fn top_level_at(&self, offset: usize) -> Option<Pair> {
        let mut pair = self.enclosing(offset)?;
        while let Some(parent) = self.parent(pair.open) {
            pair = parent;
        }
        Some(pair)
    }

    /// Pairs directly nested in `pair`, in source order.
    pub fn children(&self, pair: Pair) -> Vec<Pair> {
        let mut out = Vec::new();
        let Some(idx) = self.index_of(pair.open) else {
            return out;
        };
        let mut next = idx + 1;
        while next < self.by_open.len() && self.by_open[next].open < pair.close {
            let child = self.by_open[next];
            out.push(child);
            next = self.by_open.partition_point(|p| p.open <= child.close);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(pairs: &[(usize, usize)]) -> PairIndex {
        PairIndex::from_pairs(
            pairs
                .iter()
                .map(|&(open, close)| Pair { open, close })
                .collect(),
        )
    }

    // (a (b) (c (d)))  (e)
    fn sample() -> PairIndex {
        index(&[(10, 12), (3, 5), (7, 13), (0, 14), (17, 19)])
    }

    #[test]
    fn lookup_both_directions() {
        let idx = sample();
        assert_eq!(idx.close_of(0), Some(14));
        assert_eq!(idx.open_of(13), Some(7));
        assert_eq!(idx.close_of(1), None);
    }

    #[test]
    fn top_level_pairs() {
        let idx = sample();
        let tops: Vec<_> = idx.top_level().map(|p| p.open).collect();
        assert_eq!(tops, vec![0, 17]);
    }

    #[test]
    fn enclosing_finds_innermost() {
        let idx = sample();
        assert_eq!(idx.enclosing(11).map(|p| p.open), Some(10));
        assert_eq!(idx.enclosing(6).map(|p| p.open), Some(0));
        assert_eq!(idx.enclosing(12).map(|p| p.open), Some(10));
        assert_eq!(idx.enclosing(15), None);
        assert_eq!(idx.top_level_at(11).map(|p| p.open), Some(0));
    }

    #[test]
    fn children_skip_grandchildren() {
        let idx = sample();
        let kids: Vec<_> = idx
            .children(Pair { open: 0, close: 14 })
            .iter()
            .map(|p| p.open)
            .collect();
        assert_eq!(kids, vec![3, 7]);
    }

    #[test]
    fn parent_links() {
        let idx = sample();
        assert_eq!(idx.parent(10).map(|p| p.open), Some(7));
        assert_eq!(idx.parent(0), None);
    }
}
