#![allow(dead_code)]

use clscope_core::AnalysisConfig;
use clscope_scope::{analyze, AnalysisResult};

/// Analyze with the default configuration.
pub fn analyze_default(src: &str) -> AnalysisResult {
    analyze(src, &AnalysisConfig::default())
}

/// Byte offset of the `n`th (0-based) occurrence of `needle` in `src`.
pub fn nth(src: &str, needle: &str, n: usize) -> usize {
    src.match_indices(needle)
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("`{needle}` occurs fewer than {} times in `{src}`", n + 1))
}

/// Offset of the definition the symbol at `offset` belongs to.
pub fn def_of(a: &AnalysisResult, offset: usize) -> Option<usize> {
    let token = a
        .token_at(offset)
        .unwrap_or_else(|| panic!("no symbol at {offset}"));
    a.binding_of(token).map(|b| b.def_range.start)
}
