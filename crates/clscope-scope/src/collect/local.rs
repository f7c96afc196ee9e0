//! `let`-family, `do`-family, `lambda`, `destructuring-bind` and
//! `multiple-value-bind`.

use clscope_core::TextRange;
use clscope_reader::{Element, ElementKind, Pair};

use super::{scope_between, Collector};
use crate::binding::{Binding, BindingKind};
use crate::lambda_list::parse_lambda_list;
use crate::table::Collection;

/// One entry of a binding list: the variable and the whole entry.
struct VarSpec {
    name: String,
    def_range: TextRange,
    entry: Element,
}

impl Collector<'_> {
    /// Entries of a `let`/`do` binding list: `x` or `(x init ...)`.
    fn var_specs(&self, list: Pair) -> Vec<VarSpec> {
        self.elements(list)
            .filter_map(|entry| {
                let var = match entry.kind {
                    ElementKind::Atom => entry,
                    ElementKind::Group(spec) if !entry.quoted => self.elements(spec).next()?,
                    _ => return None,
                };
                let (name, def_range) = self.symbol(&var)?;
                Some(VarSpec {
                    name,
                    def_range,
                    entry,
                })
            })
            .collect()
    }

    /// `(let ((x 1) y) body)`; `let*` and `prog*` bind sequentially.
    pub(super) fn let_like(&mut self, pair: Pair, sequential: bool, kind: BindingKind) {
        let container = self.keyword(pair);
        let Some(list) = self.operands(pair).next().and_then(|el| el.group()) else {
            return;
        };
        for spec in self.var_specs(list) {
            let start = if sequential {
                spec.entry.end()
            } else {
                list.close + 1
            };
            let Some(scope) = scope_between(start, pair.close) else {
                continue;
            };
            let binding = Binding::local(
                spec.name,
                spec.def_range,
                kind,
                container.as_str(),
                scope,
                pair.range(),
            );
            self.push(Collection::LocalAnonymousLambdaParams, binding);
        }
    }

    /// `(do ((var init step)) (end-test result) body)`. Step forms are
    /// evaluated with every variable of the form bound, so each variable
    /// also carries a window from the list's opening bracket to its normal
    /// scope start.
    pub(super) fn do_form(&mut self, pair: Pair, sequential: bool) {
        let container = self.keyword(pair);
        let Some(list) = self.operands(pair).next().and_then(|el| el.group()) else {
            return;
        };
        for spec in self.var_specs(list) {
            if let Some(entry) = spec.entry.group() {
                if let Some(step) = self.elements(entry).nth(2) {
                    self.table.add_step_form(step.range);
                }
            }
            let start = if sequential {
                spec.entry.end()
            } else {
                list.close + 1
            };
            let Some(scope) = scope_between(start, pair.close) else {
                continue;
            };
            let binding = Binding::local(
                spec.name,
                spec.def_range,
                BindingKind::LocalVariable,
                container.as_str(),
                scope,
                pair.range(),
            )
            .with_extended_scope(TextRange::new(list.open, start));
            self.push(Collection::LocalAnonymousLambdaParams, binding);
        }
    }

    /// `(lambda (params) body)`.
    pub(super) fn lambda(&mut self, pair: Pair) {
        let Some(params) = self
            .operands(pair)
            .next()
            .and_then(|el| self.lambda_list_at(&el, false))
        else {
            return;
        };
        self.push_params(Collection::LocalAnonymousLambdaParams, "lambda", params, pair);
    }

    /// `(destructuring-bind (pattern) value body)` and
    /// `(multiple-value-bind (vars) value body)`. Like the other sequential
    /// forms, the variables are visible from the end of the list, value
    /// expression included. A form without a value binds nothing.
    pub(super) fn bind_list(&mut self, pair: Pair, destructuring: bool) {
        let container = self.keyword(pair);
        let mut operands = self.operands(pair);
        let Some(list) = operands.next().and_then(|el| el.group()) else {
            return;
        };
        if operands.next().is_none() {
            return;
        }
        let Some(params) = parse_lambda_list(self.text, self.scanned, list.open, destructuring)
        else {
            return;
        };
        let Some(scope) = scope_between(list.close + 1, pair.close) else {
            return;
        };
        for param in params {
            let binding = Binding::local(
                param.name,
                param.range,
                BindingKind::LocalVariable,
                container.as_str(),
                scope,
                pair.range(),
            );
            self.push(Collection::LocalAnonymousLambdaParams, binding);
        }
    }
}
