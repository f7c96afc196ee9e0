//! Go-to-definition and find-references.
//!
//! Both use the lookup exclusion mode: a cursor inside an excluded range
//! finds nothing, and excluded occurrences are never reported.

use clscope_core::TextRange;
use clscope_reader::SymbolToken;
use clscope_scope::{AnalysisResult, Binding};

/// The symbol under `offset` and the binding it belongs to.
pub fn target_at(analysis: &AnalysisResult, offset: usize) -> Option<(&SymbolToken, &Binding)> {
    let token = analysis.token_at(offset)?;
    let excluded = analysis.scanned().excluded(analysis.config().lookup);
    if excluded.intersects(&token.range) {
        return None;
    }
    let binding = analysis.binding_of(token)?;
    Some((token, binding))
}

pub fn definition(analysis: &AnalysisResult, offset: usize) -> Option<TextRange> {
    target_at(analysis, offset).map(|(_, binding)| binding.def_range)
}

pub fn references(
    analysis: &AnalysisResult,
    offset: usize,
    include_declaration: bool,
) -> Vec<TextRange> {
    let Some((_, binding)) = target_at(analysis, offset) else {
        return Vec::new();
    };
    let mut ranges = analysis.occurrences_of(binding, analysis.config().lookup);
    if !include_declaration {
        ranges.retain(|r| *r != binding.def_range);
    }
    ranges
}
