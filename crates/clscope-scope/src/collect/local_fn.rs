use clscope_reader::Pair;

use super::{scope_between, Collector};
use crate::binding::{Binding, BindingKind};
use crate::forms::LocalFunctionForm;
use crate::table::Collection;

impl Collector<'_> {
    /// `(flet ((name (params) body) ...) body)`, `labels` and `macrolet`.
    ///
    /// `flet` and `macrolet` names are visible in the body only. A `labels`
    /// name is visible from the definitions list onward, so every
    /// definition can call itself and its siblings.
    pub(super) fn local_functions(&mut self, pair: Pair, form: LocalFunctionForm) {
        let container = self.keyword(pair);
        let Some(group) = self.operands(pair).next().and_then(|el| el.group()) else {
            return;
        };
        let kind = match form {
            LocalFunctionForm::Macrolet => BindingKind::LocalMacro,
            LocalFunctionForm::Flet | LocalFunctionForm::Labels => BindingKind::LocalFunction,
        };
        let destructuring = form == LocalFunctionForm::Macrolet;

        for def in self.scanned.pairs.children(group) {
            let mut parts = self.elements(def);
            let Some((name, def_range)) = parts.next().and_then(|el| self.symbol(&el)) else {
                continue;
            };
            let start = match form {
                LocalFunctionForm::Labels => group.open,
                LocalFunctionForm::Flet | LocalFunctionForm::Macrolet => group.close + 1,
            };
            let params = parts
                .next()
                .and_then(|el| self.lambda_list_at(&el, destructuring));
            let doc = self.body_doc_string(parts);

            if let Some(scope) = scope_between(start, pair.close) {
                let binding =
                    Binding::local(name.clone(), def_range, kind, container.as_str(), scope, def.range())
                        .with_doc(doc);
                self.push(Collection::LocalDefinitions, binding);
            }
            if let Some(params) = params {
                self.push_params(Collection::LocalNamedLambdaParams, &name, params, def);
            }
        }
    }
}
