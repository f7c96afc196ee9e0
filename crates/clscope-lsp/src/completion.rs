use clscope_reader::chars::is_delimiter;
use clscope_scope::{AnalysisResult, Binding, BindingKind};
use hashbrown::HashMap;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Documentation};

/// The partial symbol typed just before `offset`, lower-cased.
pub fn extract_prefix(text: &str, offset: usize) -> String {
    let bytes = text.as_bytes();
    let end = offset.min(bytes.len());
    let mut start = end;
    while start > 0 && !is_delimiter(bytes[start - 1]) {
        start -= 1;
    }
    text.get(start..end).unwrap_or("").to_ascii_lowercase()
}

pub fn completion_kind(kind: BindingKind) -> CompletionItemKind {
    match kind {
        BindingKind::Function | BindingKind::LocalFunction | BindingKind::SetfExpander => {
            CompletionItemKind::FUNCTION
        }
        BindingKind::GenericFunction | BindingKind::Method => CompletionItemKind::METHOD,
        BindingKind::Macro
        | BindingKind::CompilerMacro
        | BindingKind::ModifyMacro
        | BindingKind::SymbolMacro
        | BindingKind::LocalMacro
        | BindingKind::LocalSymbolMacro => CompletionItemKind::KEYWORD,
        BindingKind::Variable
        | BindingKind::LocalVariable
        | BindingKind::Parameter
        | BindingKind::LoopVariable => CompletionItemKind::VARIABLE,
        BindingKind::Constant => CompletionItemKind::CONSTANT,
        BindingKind::Class | BindingKind::Condition | BindingKind::Type => {
            CompletionItemKind::CLASS
        }
        BindingKind::Struct => CompletionItemKind::STRUCT,
        BindingKind::Package => CompletionItemKind::MODULE,
        BindingKind::MethodCombination | BindingKind::LoopName => CompletionItemKind::REFERENCE,
    }
}

/// Completion items at `offset`: every global name plus the locals whose
/// scope contains the cursor, filtered by the typed prefix. When a name is
/// bound more than once the innermost binding describes it.
pub fn completions(analysis: &AnalysisResult, offset: usize) -> Vec<CompletionItem> {
    let prefix = extract_prefix(analysis.text(), offset);
    let mut chosen: HashMap<&str, &Binding> = HashMap::new();
    for binding in analysis.bindings_at(offset) {
        if !binding.name.starts_with(prefix.as_str()) {
            continue;
        }
        chosen
            .entry(binding.name.as_str())
            .and_modify(|current| {
                if prefers(binding, current) {
                    *current = binding;
                }
            })
            .or_insert(binding);
    }

    let mut bindings: Vec<&Binding> = chosen.into_values().collect();
    bindings.sort_by(|a, b| a.name.cmp(&b.name));
    bindings.into_iter().map(item).collect()
}

/// Locals beat globals; among equals the later definition wins.
fn prefers(candidate: &Binding, current: &Binding) -> bool {
    match (candidate.is_global(), current.is_global()) {
        (false, true) => true,
        (true, false) => false,
        _ => candidate.def_range.start >= current.def_range.start,
    }
}

fn item(binding: &Binding) -> CompletionItem {
    let detail = match &binding.container {
        Some(container) => format!("{} in {}", binding.kind, container),
        None => binding.kind.to_string(),
    };
    CompletionItem {
        label: binding.name.clone(),
        kind: Some(completion_kind(binding.kind)),
        detail: Some(detail),
        documentation: binding.doc.clone().map(Documentation::String),
        ..Default::default()
    }
}
