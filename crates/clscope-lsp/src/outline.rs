//! Document outline.
//!
//! Named definitions (globals, local functions) become named nodes and
//! their parameters nest under them. Anonymous binding forms (`let`,
//! `dolist`, `loop`, ...) become container nodes numbered per keyword in
//! source order. Nesting follows range containment.

use clscope_core::TextRange;
use clscope_scope::{AnalysisResult, Binding, BindingKind, Collection};
use hashbrown::HashMap;
use tower_lsp::lsp_types::{DocumentSymbol, SymbolKind};

use crate::line_index::LineIndex;

/// An outline node before conversion to protocol types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub name: String,
    pub detail: Option<String>,
    pub kind: SymbolKind,
    pub range: TextRange,
    pub selection: TextRange,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    fn leaf(binding: &Binding, range: TextRange) -> Self {
        OutlineNode {
            name: binding.name.clone(),
            detail: Some(binding.kind.to_string()),
            kind: symbol_kind(binding.kind),
            range,
            selection: binding.def_range,
            children: Vec::new(),
        }
    }
}

pub fn symbol_kind(kind: BindingKind) -> SymbolKind {
    match kind {
        BindingKind::Function
        | BindingKind::LocalFunction
        | BindingKind::SetfExpander
        | BindingKind::Macro
        | BindingKind::CompilerMacro
        | BindingKind::ModifyMacro
        | BindingKind::LocalMacro => SymbolKind::FUNCTION,
        BindingKind::GenericFunction | BindingKind::Method => SymbolKind::METHOD,
        BindingKind::Variable
        | BindingKind::SymbolMacro
        | BindingKind::LocalVariable
        | BindingKind::LocalSymbolMacro
        | BindingKind::Parameter
        | BindingKind::LoopVariable => SymbolKind::VARIABLE,
        BindingKind::Constant => SymbolKind::CONSTANT,
        BindingKind::Class | BindingKind::Condition | BindingKind::Type => SymbolKind::CLASS,
        BindingKind::Struct => SymbolKind::STRUCT,
        BindingKind::Package => SymbolKind::PACKAGE,
        BindingKind::MethodCombination => SymbolKind::OPERATOR,
        BindingKind::LoopName => SymbolKind::KEY,
    }
}

/// The outline of a document as a forest of nodes.
pub fn outline(analysis: &AnalysisResult) -> Vec<OutlineNode> {
    let table = analysis.table();
    let mut flat: Vec<OutlineNode> = Vec::new();

    for collection in [Collection::GlobalDefinitions, Collection::LocalDefinitions] {
        for binding in table.collection(collection).values().flatten() {
            flat.push(OutlineNode::leaf(binding, binding.form.cover(binding.def_range)));
        }
    }
    for collection in [
        Collection::GlobalNamedLambdaParams,
        Collection::LocalNamedLambdaParams,
    ] {
        for binding in table.collection(collection).values().flatten() {
            flat.push(OutlineNode::leaf(binding, binding.def_range));
        }
    }

    // Anonymous containers, keyed by the form that binds them.
    let mut containers: HashMap<TextRange, OutlineNode> = HashMap::new();
    for collection in [
        Collection::LocalAnonymousLambdaParams,
        Collection::LocalSingleVariables,
        Collection::LocalLoopBindings,
    ] {
        for binding in table.collection(collection).values().flatten() {
            let container = containers.entry(binding.form).or_insert_with(|| OutlineNode {
                name: binding.container.clone().unwrap_or_default(),
                detail: None,
                kind: SymbolKind::NAMESPACE,
                range: binding.form,
                selection: binding.form,
                children: Vec::new(),
            });
            container
                .children
                .push(OutlineNode::leaf(binding, binding.def_range));
        }
    }
    let mut containers: Vec<OutlineNode> = containers.into_values().collect();
    containers.sort_by_key(|c| c.range.start);
    let mut counters: HashMap<String, usize> = HashMap::new();
    for mut container in containers {
        let n = counters.entry(container.name.clone()).or_insert(0);
        *n += 1;
        container.name = format!("{} {}", container.name, n);
        // Variables are placed again by containment below.
        flat.append(&mut container.children);
        flat.push(container);
    }

    nest(flat)
}

/// Build a forest where each node is a child of the smallest node whose
/// range contains it.
fn nest(mut flat: Vec<OutlineNode>) -> Vec<OutlineNode> {
    // Parents sort before their children: earlier start, then longer.
    flat.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(b.range.end.cmp(&a.range.end))
            .then(a.selection.start.cmp(&b.selection.start))
    });

    let mut roots: Vec<OutlineNode> = Vec::new();
    let mut stack: Vec<OutlineNode> = Vec::new();
    for node in flat {
        while let Some(top) = stack.last() {
            if top.range.contains_range(&node.range) {
                break;
            }
            pop_into(&mut stack, &mut roots);
        }
        stack.push(node);
    }
    while !stack.is_empty() {
        pop_into(&mut stack, &mut roots);
    }
    roots
}

fn pop_into(stack: &mut Vec<OutlineNode>, roots: &mut Vec<OutlineNode>) {
    if let Some(done) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => roots.push(done),
        }
    }
}

/// Convert the outline to protocol symbols.
pub fn document_symbols(analysis: &AnalysisResult) -> Vec<DocumentSymbol> {
    let index = LineIndex::new(analysis.text());
    outline(analysis)
        .into_iter()
        .map(|node| to_document_symbol(node, &index))
        .collect()
}

#[allow(deprecated)] // `DocumentSymbol::deprecated` has no replacement field
fn to_document_symbol(node: OutlineNode, index: &LineIndex<'_>) -> DocumentSymbol {
    let children: Vec<DocumentSymbol> = node
        .children
        .into_iter()
        .map(|child| to_document_symbol(child, index))
        .collect();
    DocumentSymbol {
        name: node.name,
        detail: node.detail,
        kind: node.kind,
        tags: None,
        deprecated: None,
        range: index.range(node.range),
        selection_range: index.range(node.selection),
        children: (!children.is_empty()).then_some(children),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clscope_core::AnalysisConfig;
    use clscope_scope::analyze;

    fn tree(src: &str) -> Vec<OutlineNode> {
        outline(&analyze(src, &AnalysisConfig::default()))
    }

    fn names(nodes: &[OutlineNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn parameters_nest_under_their_function() {
        let nodes = tree("(defun f (a b) (+ a b))\n(defvar *v* 1)");
        assert_eq!(names(&nodes), vec!["f", "*v*"]);
        assert_eq!(names(&nodes[0].children), vec!["a", "b"]);
        assert_eq!(nodes[0].kind, SymbolKind::FUNCTION);
        assert_eq!(nodes[1].kind, SymbolKind::VARIABLE);
    }

    #[test]
    fn anonymous_containers_are_numbered() {
        let nodes = tree("(defun f () (let ((x 1)) x) (let ((y 2)) (dolist (z y) z)))");
        let f = &nodes[0];
        assert_eq!(names(&f.children), vec!["let 1", "let 2"]);
        assert_eq!(names(&f.children[0].children), vec!["x"]);
        let second = &f.children[1];
        assert_eq!(names(&second.children), vec!["y", "dolist 1"]);
        assert_eq!(names(&second.children[1].children), vec!["z"]);
    }

    #[test]
    fn local_functions_are_named_nodes() {
        let nodes = tree("(flet ((helper (n) n)) (helper 1))");
        assert_eq!(names(&nodes), vec!["helper"]);
        assert_eq!(names(&nodes[0].children), vec!["n"]);
    }

    #[test]
    fn protocol_ranges_cover_selection() {
        let src = "(defun f (x)\n  (let ((y x))\n    y))";
        let a = analyze(src, &AnalysisConfig::default());
        let symbols = document_symbols(&a);
        assert_eq!(symbols.len(), 1);
        let f = &symbols[0];
        assert_eq!(f.range.start.line, 0);
        assert_eq!(f.range.end.line, 2);
        assert!(f.selection_range.start >= f.range.start);
        let children = f.children.as_ref().unwrap();
        assert_eq!(children[0].name, "x");
        assert_eq!(children[1].name, "let 1");
    }
}
