//! Fixed-layout parameter lists of `defsetf` and
//! `define-method-combination` long forms.

use clscope_core::TextRange;
use clscope_reader::{ElementKind, Elements, Pair};

use super::{scope_between, Collector};
use crate::binding::{Binding, BindingKind};
use crate::lambda_list::{parse_lambda_list, LambdaParam};
use crate::table::Collection;

impl Collector<'_> {
    /// `(defsetf access (params) (store-vars) body)`. The short form
    /// `(defsetf access update)` binds nothing.
    pub(super) fn defsetf(&mut self, pair: Pair, name: &str, mut operands: Elements<'_>) {
        let Some(list) = operands.next() else {
            return;
        };
        if list.group().is_none() {
            return;
        }
        let Some(params) = self.lambda_list_at(&list, false) else {
            return;
        };
        self.push_params(Collection::GlobalNamedLambdaParams, name, params, pair);

        if let Some(stores) = operands.next().and_then(|el| el.group()) {
            self.bind_names_after(stores, name, pair);
        }
    }

    /// `(define-method-combination name (params) (groups) [(:arguments ...)]
    /// [(:generic-function g)] body)`.
    pub(super) fn define_method_combination(
        &mut self,
        pair: Pair,
        name: &str,
        mut operands: Elements<'_>,
    ) {
        let Some(list) = operands.next() else {
            return;
        };
        if list.group().is_none() {
            // Short form: keyword options only.
            return;
        }
        let Some(params) = self.lambda_list_at(&list, false) else {
            return;
        };
        self.push_params(Collection::GlobalNamedLambdaParams, name, params, pair);

        // Method-group specifiers: `(var qualifier-pattern ... options)`.
        let Some(groups) = operands.next().and_then(|el| el.group()) else {
            return;
        };
        let specifiers: Vec<_> = self
            .elements(groups)
            .filter_map(|el| el.group())
            .filter_map(|spec| self.elements(spec).next())
            .filter_map(|var| self.symbol(&var))
            .collect();
        for (var, def_range) in specifiers {
            self.push_aux(var, def_range, name, groups.close + 1, pair);
        }

        for option in operands {
            let ElementKind::Group(option) = option.kind else {
                continue;
            };
            let mut parts = self.elements(option);
            let Some(head) = parts.next() else {
                continue;
            };
            let head = head.text(self.text).to_ascii_lowercase();
            match head.as_str() {
                ":arguments" => {
                    if let Some(args) = self.lambda_list_at_pair(option) {
                        for param in args {
                            self.push_aux(param.name, param.range, name, option.close + 1, pair);
                        }
                    }
                }
                ":generic-function" => {
                    if let Some((var, def_range)) = parts.next().and_then(|el| self.symbol(&el)) {
                        self.push_aux(var, def_range, name, option.close + 1, pair);
                    }
                }
                _ => break,
            }
        }
    }

    /// Every symbol directly inside `group`, visible after it.
    fn bind_names_after(&mut self, group: Pair, container: &str, form: Pair) {
        let names: Vec<_> = self
            .elements(group)
            .filter_map(|el| self.symbol(&el))
            .collect();
        for (var, def_range) in names {
            self.push_aux(var, def_range, container, group.close + 1, form);
        }
    }

    /// `(:arguments . lambda-list)`: the option itself read as a lambda
    /// list; the keyword head is not bindable.
    fn lambda_list_at_pair(&self, option: Pair) -> Option<Vec<LambdaParam>> {
        parse_lambda_list(self.text, self.scanned, option.open, false)
    }

    fn push_aux(
        &mut self,
        name: String,
        def_range: TextRange,
        container: &str,
        start: usize,
        form: Pair,
    ) {
        let Some(scope) = scope_between(start, form.close) else {
            return;
        };
        let binding = Binding::local(
            name,
            def_range,
            BindingKind::Parameter,
            container,
            scope,
            form.range(),
        );
        self.push(Collection::GlobalNamedLambdaParams, binding);
    }
}
