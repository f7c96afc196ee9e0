//! Call hierarchy over global function-like definitions.
//!
//! Every `defun`/`defmacro`/`defgeneric`/`defmethod` (and friends) is a
//! node. A call form `(callee ...)` whose head resolves to another such
//! definition is an edge from the innermost definition containing it, or
//! from the synthetic `document` node for top-level calls.

use clscope_core::TextRange;
use clscope_scope::{AnalysisResult, BindingKind};
use hashbrown::HashMap;
use tower_lsp::lsp_types::{
    CallHierarchyIncomingCall, CallHierarchyItem, CallHierarchyOutgoingCall, SymbolKind, Url,
};

use crate::line_index::LineIndex;
use crate::navigation::target_at;
use crate::outline::symbol_kind;

pub const DOCUMENT_NODE: &str = "document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallNode {
    pub name: String,
    /// `None` for the document node.
    pub kind: Option<BindingKind>,
    /// The whole defining form.
    pub range: TextRange,
    /// The defined name.
    pub selection: TextRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub caller: usize,
    pub callee: usize,
    /// The call form.
    pub range: TextRange,
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    pub nodes: Vec<CallNode>,
    /// In source order of the call forms.
    pub edges: Vec<CallEdge>,
}

impl CallGraph {
    /// Index of the document node.
    pub const DOCUMENT: usize = 0;

    pub fn build(analysis: &AnalysisResult) -> Self {
        let text = analysis.text();
        let mut nodes = vec![CallNode {
            name: DOCUMENT_NODE.to_string(),
            kind: None,
            range: TextRange::new(0, text.len()),
            selection: TextRange::empty(0),
        }];
        let mut defs: Vec<_> = analysis
            .table()
            .globals()
            .values()
            .flatten()
            .filter(|b| b.kind.is_function_like())
            .collect();
        defs.sort_by_key(|b| b.def_range.start);
        nodes.extend(defs.into_iter().map(|b| CallNode {
            name: b.name.clone(),
            kind: Some(b.kind),
            range: b.form,
            selection: b.def_range,
        }));
        let by_def: HashMap<TextRange, usize> = nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, n)| (n.selection, i))
            .collect();

        let scanned = analysis.scanned();
        // Calls are structure, so quoted templates follow the static mode.
        let excluded = scanned.excluded(analysis.config().static_analysis);
        let mut edges = Vec::new();
        for pair in scanned.pairs.iter() {
            if excluded.contains(pair.open) {
                continue;
            }
            let Some(head) = scanned.elements(text, *pair).next() else {
                continue;
            };
            if head.quoted || !head.is_atom() {
                continue;
            }
            let Some((_, binding)) = target_at(analysis, head.range.start) else {
                continue;
            };
            if !binding.is_global() || !binding.kind.is_function_like() {
                continue;
            }
            let Some(&callee) = by_def.get(&binding.def_range) else {
                continue;
            };
            let caller = innermost_node(&nodes, pair.open);
            if caller == callee {
                continue;
            }
            edges.push(CallEdge {
                caller,
                callee,
                range: pair.range(),
            });
        }
        edges.sort_by_key(|e| e.range.start);

        tracing::debug!(nodes = nodes.len(), edges = edges.len(), "built call graph");
        CallGraph { nodes, edges }
    }

    /// The node whose name is at `offset`.
    pub fn node_named_at(&self, offset: usize) -> Option<usize> {
        self.nodes
            .iter()
            .skip(1)
            .position(|n| n.selection.contains_inclusive(offset))
            .map(|i| i + 1)
    }

    /// Callers of `node`, each with the call forms it contains.
    pub fn incoming(&self, node: usize) -> Vec<(usize, Vec<TextRange>)> {
        group(self.edges.iter().filter(|e| e.callee == node), |e| e.caller)
    }

    /// Callees of `node`, each with the call forms in `node`.
    pub fn outgoing(&self, node: usize) -> Vec<(usize, Vec<TextRange>)> {
        group(self.edges.iter().filter(|e| e.caller == node), |e| e.callee)
    }
}

/// Smallest definition form containing `offset`, else the document.
fn innermost_node(nodes: &[CallNode], offset: usize) -> usize {
    nodes
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, n)| n.range.contains(offset))
        .min_by_key(|(_, n)| n.range.len())
        .map_or(CallGraph::DOCUMENT, |(i, _)| i)
}

fn group<'e>(
    edges: impl Iterator<Item = &'e CallEdge>,
    key: impl Fn(&CallEdge) -> usize,
) -> Vec<(usize, Vec<TextRange>)> {
    let mut out: Vec<(usize, Vec<TextRange>)> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for edge in edges {
        let k = key(edge);
        let i = *slot.entry(k).or_insert_with(|| {
            out.push((k, Vec::new()));
            out.len() - 1
        });
        out[i].1.push(edge.range);
    }
    out
}

// ── Protocol conversion ──────────────────────────────────────────

pub fn hierarchy_item(
    graph: &CallGraph,
    node: usize,
    uri: &Url,
    index: &LineIndex<'_>,
) -> Option<CallHierarchyItem> {
    let n = graph.nodes.get(node)?;
    Some(CallHierarchyItem {
        name: n.name.clone(),
        kind: n.kind.map_or(SymbolKind::FILE, symbol_kind),
        tags: None,
        detail: n.kind.map(|k| k.to_string()),
        uri: uri.clone(),
        range: index.range(n.range),
        selection_range: index.range(n.selection),
        data: n.kind.is_none().then(|| serde_json::json!(DOCUMENT_NODE)),
    })
}

/// The node a client-supplied item refers to.
fn node_of_item(
    graph: &CallGraph,
    index: &LineIndex<'_>,
    item: &CallHierarchyItem,
) -> Option<usize> {
    if item.data.as_ref().and_then(|d| d.as_str()) == Some(DOCUMENT_NODE) {
        return Some(CallGraph::DOCUMENT);
    }
    let offset = index
        .offset(item.selection_range.start)
        .map_err(|err| tracing::warn!("call hierarchy item: {err}"))
        .ok()?;
    graph.node_named_at(offset)
}

pub fn prepare(
    analysis: &AnalysisResult,
    uri: &Url,
    offset: usize,
) -> Option<Vec<CallHierarchyItem>> {
    let (_, binding) = target_at(analysis, offset)?;
    if !binding.is_global() || !binding.kind.is_function_like() {
        return None;
    }
    let graph = CallGraph::build(analysis);
    let index = LineIndex::new(analysis.text());
    let node = graph.node_named_at(binding.def_range.start)?;
    hierarchy_item(&graph, node, uri, &index).map(|item| vec![item])
}

pub fn incoming_calls(
    analysis: &AnalysisResult,
    item: &CallHierarchyItem,
) -> Vec<CallHierarchyIncomingCall> {
    let graph = CallGraph::build(analysis);
    let index = LineIndex::new(analysis.text());
    let Some(node) = node_of_item(&graph, &index, item) else {
        return Vec::new();
    };
    graph
        .incoming(node)
        .into_iter()
        .filter_map(|(caller, ranges)| {
            Some(CallHierarchyIncomingCall {
                from: hierarchy_item(&graph, caller, &item.uri, &index)?,
                from_ranges: ranges.into_iter().map(|r| index.range(r)).collect(),
            })
        })
        .collect()
}

pub fn outgoing_calls(
    analysis: &AnalysisResult,
    item: &CallHierarchyItem,
) -> Vec<CallHierarchyOutgoingCall> {
    let graph = CallGraph::build(analysis);
    let index = LineIndex::new(analysis.text());
    let Some(node) = node_of_item(&graph, &index, item) else {
        return Vec::new();
    };
    graph
        .outgoing(node)
        .into_iter()
        .filter_map(|(callee, ranges)| {
            Some(CallHierarchyOutgoingCall {
                to: hierarchy_item(&graph, callee, &item.uri, &index)?,
                from_ranges: ranges.into_iter().map(|r| index.range(r)).collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clscope_core::AnalysisConfig;
    use clscope_scope::analyze;

    const SRC: &str = "(defun f (x) (+ x 1))\n\
                       (defun g () (f 2) (f 3))\n\
                       (defmacro m () `(g))\n\
                       (defun h () (g) (h))\n\
                       (h)";

    fn graph() -> (AnalysisResult, CallGraph) {
        let a = analyze(SRC, &AnalysisConfig::default());
        let g = CallGraph::build(&a);
        (a, g)
    }

    fn node(graph: &CallGraph, name: &str) -> usize {
        graph.nodes.iter().position(|n| n.name == name).unwrap()
    }

    fn names(graph: &CallGraph, calls: &[(usize, Vec<TextRange>)]) -> Vec<(String, usize)> {
        calls
            .iter()
            .map(|(n, ranges)| (graph.nodes[*n].name.clone(), ranges.len()))
            .collect()
    }

    #[test]
    fn nodes_are_function_like_globals() {
        let (_, g) = graph();
        let all: Vec<_> = g.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(all, vec!["document", "f", "g", "m", "h"]);
    }

    #[test]
    fn incoming_groups_call_sites_by_caller() {
        let (_, g) = graph();
        assert_eq!(names(&g, &g.incoming(node(&g, "f"))), vec![("g".into(), 2)]);
        assert_eq!(names(&g, &g.incoming(node(&g, "g"))), vec![("h".into(), 1)]);
    }

    #[test]
    fn self_calls_and_quoted_calls_are_skipped() {
        let (_, g) = graph();
        // `(h)` inside h is recursion; `(g)` inside the backquote is data.
        assert_eq!(names(&g, &g.outgoing(node(&g, "h"))), vec![("g".into(), 1)]);
        assert!(g.outgoing(node(&g, "m")).is_empty());
    }

    #[test]
    fn top_level_calls_come_from_the_document() {
        let (_, g) = graph();
        assert_eq!(
            names(&g, &g.incoming(node(&g, "h"))),
            vec![("document".into(), 1)]
        );
    }

    #[test]
    fn protocol_round_trip() {
        let (a, _) = graph();
        let uri = Url::parse("file:///tmp/calls.lisp").unwrap();
        let f_use = SRC.find("(f 2)").unwrap() + 1;
        let items = prepare(&a, &uri, f_use).unwrap();
        assert_eq!(items[0].name, "f");
        assert_eq!(items[0].kind, SymbolKind::FUNCTION);

        let incoming = incoming_calls(&a, &items[0]);
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].from.name, "g");
        assert_eq!(incoming[0].from_ranges.len(), 2);
        assert_eq!(incoming[0].from_ranges[0].start.line, 1);

        let graph = CallGraph::build(&a);
        let document =
            hierarchy_item(&graph, CallGraph::DOCUMENT, &uri, &LineIndex::new(SRC)).unwrap();
        let outgoing = outgoing_calls(&a, &document);
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to.name, "h");
    }
}
