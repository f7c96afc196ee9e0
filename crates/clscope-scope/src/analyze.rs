//! One-shot document analysis.

use std::sync::OnceLock;

use clscope_core::{AnalysisConfig, ExcludeMode, TextRange};
use clscope_reader::{scan, symbol_tokens, Scanned, SymbolToken};

use crate::binding::Binding;
use crate::collect::collect;
use crate::resolve::{is_shadowed, Resolution};
use crate::table::SymbolTable;

/// Everything known about one version of a document. Immutable; derived
/// views are computed on first use.
#[derive(Debug)]
pub struct AnalysisResult {
    text: String,
    config: AnalysisConfig,
    scanned: Scanned,
    table: SymbolTable,
    tokens: OnceLock<Vec<SymbolToken>>,
}

/// Analyze `text`.
pub fn analyze(text: &str, config: &AnalysisConfig) -> AnalysisResult {
    let scanned = scan(text);
    let table = collect(text, &scanned, config.static_analysis, &|| false).unwrap_or_default();
    AnalysisResult::new(text, config, scanned, table)
}

/// Analyze `text`, giving up with `None` when `cancelled` returns true
/// between collector passes.
pub fn analyze_cancellable(
    text: &str,
    config: &AnalysisConfig,
    cancelled: impl Fn() -> bool,
) -> Option<AnalysisResult> {
    let scanned = scan(text);
    let table = collect(text, &scanned, config.static_analysis, &cancelled)?;
    Some(AnalysisResult::new(text, config, scanned, table))
}

impl AnalysisResult {
    fn new(text: &str, config: &AnalysisConfig, scanned: Scanned, table: SymbolTable) -> Self {
        if let Some(at) = scanned.truncated_at {
            tracing::debug!(at, "unterminated string or block comment");
        }
        tracing::debug!(
            len = text.len(),
            pairs = scanned.pairs.len(),
            bindings = table.len(),
            "analyzed document"
        );
        AnalysisResult {
            text: text.to_string(),
            config: *config,
            scanned,
            table,
            tokens: OnceLock::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn scanned(&self) -> &Scanned {
        &self.scanned
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Every symbol written in the document, in source order.
    pub fn tokens(&self) -> &[SymbolToken] {
        self.tokens
            .get_or_init(|| symbol_tokens(&self.text, &self.scanned))
    }

    /// The token under `offset`; a cursor just past a symbol still selects it.
    pub fn token_at(&self, offset: usize) -> Option<&SymbolToken> {
        let tokens = self.tokens();
        let idx = tokens.partition_point(|t| t.range.end < offset);
        tokens.get(idx).filter(|t| t.range.contains_inclusive(offset))
    }

    /// Tokens outside the exclusion ranges of `mode`.
    pub fn occurrences(&self, mode: ExcludeMode) -> impl Iterator<Item = &SymbolToken> + '_ {
        let excluded = self.scanned.excluded(mode);
        self.tokens()
            .iter()
            .filter(move |t| !excluded.intersects(&t.range))
    }

    /// Resolve `token` at its own position. Tokens in a quoted context are
    /// resolved without a position.
    pub fn resolve_token(&self, token: &SymbolToken) -> Resolution<'_> {
        let position = if self.scanned.quoted_context().contains(token.range.start) {
            None
        } else {
            Some(token.range.start)
        };
        self.table.resolve(&token.name, token.range, position)
    }

    /// The binding an occurrence belongs to, unless a local binding
    /// shadows it there.
    pub fn binding_of(&self, token: &SymbolToken) -> Option<&Binding> {
        let resolution = self.resolve_token(token);
        let binding = resolution.binding?;
        (!is_shadowed(token.range, resolution.shadow)).then_some(binding)
    }

    /// Occurrences (under `mode`) paired with the binding they belong to.
    pub fn resolved_occurrences(
        &self,
        mode: ExcludeMode,
    ) -> impl Iterator<Item = (&SymbolToken, &Binding)> + '_ {
        self.occurrences(mode)
            .filter_map(move |t| self.binding_of(t).map(|b| (t, b)))
    }

    /// Ranges of every occurrence of `target` under `mode`, including its
    /// definition.
    pub fn occurrences_of(&self, target: &Binding, mode: ExcludeMode) -> Vec<TextRange> {
        self.occurrences(mode)
            .filter(|t| t.name == target.name)
            .filter(|t| self.binding_of(t).is_some_and(|b| b.same_definition(target)))
            .map(|t| t.range)
            .collect()
    }

    /// Global names plus the bindings visible at `offset`.
    pub fn bindings_at(&self, offset: usize) -> Vec<&Binding> {
        self.table.visible_at(offset)
    }
}
