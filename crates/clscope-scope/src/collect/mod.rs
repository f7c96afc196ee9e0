//! Definition collection.
//!
//! Every indexed bracket pair whose first element is a recognized keyword
//! is a candidate form. Candidates are grouped by [`Category`] and each
//! category runs as its own pass; cancellation is checked between passes.

mod doc;
mod fixed_lists;
mod global;
mod local;
mod local_fn;
mod loop_form;
mod single_var;

use clscope_core::{ExcludeMode, RangeSet, TextRange};
use clscope_reader::{Element, ElementKind, Elements, Pair, Scanned};

use crate::binding::{is_bindable, normalize_name, Binding, BindingKind};
use crate::forms::{classify, Category, FormHead};
use crate::lambda_list::{parse_lambda_list, LambdaParam};
use crate::table::{Collection, SymbolTable};

pub(crate) struct Collector<'a> {
    text: &'a str,
    scanned: &'a Scanned,
    excluded: &'a RangeSet,
    table: SymbolTable,
}

/// Collect all definitions of `text`. Returns `None` if `cancelled`
/// reports true between passes.
pub(crate) fn collect(
    text: &str,
    scanned: &Scanned,
    mode: ExcludeMode,
    cancelled: &dyn Fn() -> bool,
) -> Option<SymbolTable> {
    let mut collector = Collector {
        text,
        scanned,
        excluded: scanned.excluded(mode),
        table: SymbolTable::new(),
    };
    let mut buckets: [Vec<(Pair, FormHead)>; Category::ALL.len()] = Default::default();
    for (pair, head) in collector.form_heads() {
        buckets[head.category().index()].push((pair, head));
    }
    for category in Category::ALL {
        if cancelled() {
            tracing::debug!(?category, "definition collection cancelled");
            return None;
        }
        let forms = &buckets[category.index()];
        for &(pair, head) in forms {
            collector.form(pair, head);
        }
        tracing::trace!(?category, forms = forms.len(), "collected");
    }
    Some(collector.table)
}

impl<'a> Collector<'a> {
    /// Candidate forms, in order of their opening bracket.
    fn form_heads(&self) -> Vec<(Pair, FormHead)> {
        let mut out = Vec::new();
        for pair in self.scanned.pairs.iter() {
            if self.excluded.contains(pair.open) {
                continue;
            }
            let Some(first) = self.elements(*pair).next() else {
                continue;
            };
            if !first.is_atom() || first.quoted {
                continue;
            }
            if let Some(head) = classify(first.text(self.text)) {
                out.push((*pair, head));
            }
        }
        out
    }

    fn form(&mut self, pair: Pair, head: FormHead) {
        match head {
            FormHead::Global(form) => self.global(pair, form),
            FormHead::LetLike { sequential, kind } => self.let_like(pair, sequential, kind),
            FormHead::Do { sequential } => self.do_form(pair, sequential),
            FormHead::Lambda => self.lambda(pair),
            FormHead::DestructuringBind => self.bind_list(pair, true),
            FormHead::MultipleValueBind => self.bind_list(pair, false),
            FormHead::LocalFunctions(form) => self.local_functions(pair, form),
            FormHead::SingleVar(form) => self.single_var(pair, form),
            FormHead::Loop => self.loop_form(pair),
        }
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn elements(&self, pair: Pair) -> Elements<'a> {
        self.scanned.elements(self.text, pair)
    }

    /// The elements of `pair` after its head.
    fn operands(&self, pair: Pair) -> Elements<'a> {
        let mut els = self.elements(pair);
        els.next();
        els
    }

    /// A bindable symbol written as `el`.
    fn symbol(&self, el: &Element) -> Option<(String, TextRange)> {
        if el.kind != ElementKind::Atom || el.quoted {
            return None;
        }
        let name = normalize_name(el.text(self.text));
        is_bindable(&name).then_some((name, el.range))
    }

    /// The keyword of the form at `pair`, without package prefix.
    fn keyword(&self, pair: Pair) -> String {
        self.elements(pair)
            .next()
            .map(|el| {
                let lower = el.text(self.text).to_ascii_lowercase();
                crate::forms::strip_cl_prefix(&lower).to_string()
            })
            .unwrap_or_default()
    }

    /// Parameters of the lambda list written as `el`; `nil` is an empty list.
    fn lambda_list_at(&self, el: &Element, destructuring: bool) -> Option<Vec<LambdaParam>> {
        match el.kind {
            ElementKind::Group(list) if !el.quoted => {
                parse_lambda_list(self.text, self.scanned, list.open, destructuring)
            }
            ElementKind::Atom if el.text(self.text).eq_ignore_ascii_case("nil") => Some(Vec::new()),
            _ => None,
        }
    }

    /// Bind `params` sequentially up to the close of `form`.
    fn push_params(
        &mut self,
        collection: Collection,
        container: &str,
        params: Vec<LambdaParam>,
        form: Pair,
    ) {
        for param in params {
            let Some(scope) = scope_between(param.visible_from, form.close) else {
                continue;
            };
            let binding = Binding::local(
                param.name,
                param.range,
                BindingKind::Parameter,
                container,
                scope,
                form.range(),
            );
            self.push(collection, binding);
        }
    }

    /// Register a binding unless its name lies in an excluded range.
    fn push(&mut self, collection: Collection, binding: Binding) {
        if self.excluded.intersects(&binding.def_range) {
            tracing::trace!(name = %binding.name, "definition inside excluded range");
            return;
        }
        self.table.insert(collection, binding);
    }
}

/// `[start, end]` as a scope, or `None` if the form ends before `start`.
fn scope_between(start: usize, end: usize) -> Option<TextRange> {
    (start <= end).then(|| TextRange::new(start, end))
}
