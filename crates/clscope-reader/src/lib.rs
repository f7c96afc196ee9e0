pub mod chars;
pub mod elements;
pub mod pairs;
pub mod scanner;
pub mod token;

pub use elements::{Element, ElementKind, Elements};
pub use pairs::{Pair, PairIndex};
pub use scanner::{scan, QuoteRanges, Scanned};
pub use token::{symbol_tokens, SymbolToken};
