use clscope_core::TextRange;
use clscope_scope::{AnalysisResult, BindingKind};
use hashbrown::HashMap;
use tower_lsp::lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokens,
    SemanticTokensFullOptions, SemanticTokensLegend, SemanticTokensOptions,
    SemanticTokensServerCapabilities,
};

use crate::line_index::LineIndex;

/// Supported semantic token types
pub const TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::NAMESPACE, // 0 - packages
    SemanticTokenType::TYPE,      // 1 - classes, structs, conditions, types
    SemanticTokenType::FUNCTION,  // 2 - functions, methods, local functions
    SemanticTokenType::MACRO,     // 3 - macros, symbol macros
    SemanticTokenType::VARIABLE,  // 4 - special and local variables
    SemanticTokenType::PARAMETER, // 5 - lambda-list parameters
    SemanticTokenType::KEYWORD,   // 6 - loop names, method combinations
];

/// Supported semantic token modifiers
pub const TOKEN_MODIFIERS: &[SemanticTokenModifier] = &[
    SemanticTokenModifier::DEFINITION, // 0 - at definition site
    SemanticTokenModifier::READONLY,   // 1 - constants
];

const DEFINITION: u32 = 1 << 0;
const READONLY: u32 = 1 << 1;

/// Create the semantic tokens capability
pub fn semantic_tokens_options() -> SemanticTokensServerCapabilities {
    SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
        legend: SemanticTokensLegend {
            token_types: TOKEN_TYPES.to_vec(),
            token_modifiers: TOKEN_MODIFIERS.to_vec(),
        },
        full: Some(SemanticTokensFullOptions::Bool(true)),
        range: None,
        work_done_progress_options: Default::default(),
    })
}

/// Map a binding kind to a semantic token type index
pub fn token_type(kind: BindingKind) -> u32 {
    match kind {
        BindingKind::Package => 0,
        BindingKind::Class | BindingKind::Condition | BindingKind::Struct | BindingKind::Type => 1,
        BindingKind::Function
        | BindingKind::GenericFunction
        | BindingKind::Method
        | BindingKind::SetfExpander
        | BindingKind::LocalFunction => 2,
        BindingKind::Macro
        | BindingKind::CompilerMacro
        | BindingKind::ModifyMacro
        | BindingKind::SymbolMacro
        | BindingKind::LocalMacro
        | BindingKind::LocalSymbolMacro => 3,
        BindingKind::Variable
        | BindingKind::Constant
        | BindingKind::LocalVariable
        | BindingKind::LoopVariable => 4,
        BindingKind::Parameter => 5,
        BindingKind::LoopName | BindingKind::MethodCombination => 6,
    }
}

fn modifiers(kind: BindingKind, definition: bool) -> u32 {
    let mut bits = 0;
    if definition {
        bits |= DEFINITION;
    }
    if kind == BindingKind::Constant {
        bits |= READONLY;
    }
    bits
}

/// A token before delta encoding; `line` and `col` are absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteToken {
    pub line: u32,
    pub col: u32,
    pub length: u32,
    pub token_type: u32,
    pub modifiers: u32,
}

/// Tokens for every definition and every unshadowed occurrence resolving to
/// one, using the highlight exclusion mode. Sorted by position.
pub fn absolute_tokens(analysis: &AnalysisResult) -> Vec<AbsoluteToken> {
    let mode = analysis.config().highlight;
    let excluded = analysis.scanned().excluded(mode);
    let mut by_range: HashMap<TextRange, (u32, u32)> = HashMap::new();

    for (token, binding) in analysis.resolved_occurrences(mode) {
        let definition = token.range == binding.def_range;
        by_range.insert(
            token.range,
            (token_type(binding.kind), modifiers(binding.kind, definition)),
        );
    }
    // Shadowed definition sites (a global `defun` inside a `let` binding the
    // same name) still get their token.
    for (_, binding) in analysis.table().iter() {
        let is_token = analysis
            .token_at(binding.def_range.start)
            .is_some_and(|t| t.range == binding.def_range);
        if is_token && !excluded.intersects(&binding.def_range) {
            by_range.insert(
                binding.def_range,
                (token_type(binding.kind), modifiers(binding.kind, true)),
            );
        }
    }

    let index = LineIndex::new(analysis.text());
    let mut tokens: Vec<AbsoluteToken> = by_range
        .into_iter()
        // `|multi\nline|` symbols cannot be expressed in the encoding.
        .filter(|(range, _)| index.line_of(range.start) == index.line_of(range.end))
        .map(|(range, (token_type, modifiers))| {
            let start = index.position(range.start);
            AbsoluteToken {
                line: start.line,
                col: start.character,
                length: index.utf16_len(range),
                token_type,
                modifiers,
            }
        })
        .collect();
    tokens.sort_by_key(|t| (t.line, t.col));
    tokens
}

/// Convert to delta-encoded format
pub fn encode(tokens: &[AbsoluteToken]) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_col = 0u32;

    for t in tokens {
        let delta_line = t.line - prev_line;
        let delta_col = if delta_line == 0 { t.col - prev_col } else { t.col };

        result.push(SemanticToken {
            delta_line,
            delta_start: delta_col,
            length: t.length,
            token_type: t.token_type,
            token_modifiers_bitset: t.modifiers,
        });

        prev_line = t.line;
        prev_col = t.col;
    }
    result
}

pub fn semantic_tokens(analysis: &AnalysisResult) -> SemanticTokens {
    SemanticTokens {
        result_id: None,
        data: encode(&absolute_tokens(analysis)),
    }
}
