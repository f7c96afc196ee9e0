use clscope_reader::Pair;

use super::{scope_between, Collector};
use crate::binding::Binding;
use crate::forms::SingleVarForm;
use crate::table::Collection;

impl Collector<'_> {
    /// `(dolist (x list [result]) body)`, `(with-open-file (s path) body)`
    /// and similar. For iteration forms the variable is visible from the
    /// end of the list/count expression, so the result form sees it.
    pub(super) fn single_var(&mut self, pair: Pair, form: SingleVarForm) {
        let container = self.keyword(pair);
        let Some(spec) = self.operands(pair).next().and_then(|el| el.group()) else {
            return;
        };
        let mut parts = self.elements(spec);
        let Some((name, def_range)) = parts.next().and_then(|el| self.symbol(&el)) else {
            return;
        };
        let start = match parts.next() {
            Some(source) if form.iterates => source.end(),
            _ => spec.close + 1,
        };
        let Some(scope) = scope_between(start, pair.close) else {
            return;
        };
        let binding = Binding::local(name, def_range, form.kind, container, scope, pair.range());
        self.push(Collection::LocalSingleVariables, binding);
    }
}

#[cfg(test)]
mod tests {
    use clscope_core::ExcludeMode;
    use clscope_reader::scan;

    use crate::binding::BindingKind;
    use crate::collect::collect;
    use crate::table::{Collection, SymbolTable};

    fn table(src: &str) -> SymbolTable {
        let s = scan(src);
        collect(src, &s, ExcludeMode::CommentString, &|| false).unwrap()
    }

    #[test]
    fn dolist_result_form_sees_variable() {
        let src = "(dolist (x items x) (print x))";
        let t = table(src);
        let x = &t.collection(Collection::LocalSingleVariables)["x"][0];
        assert_eq!(x.container.as_deref(), Some("dolist"));
        assert_eq!(x.scope.unwrap().slice(src), " x) (print x)");
        assert!(!x.is_visible_at(src.find("items").unwrap()));
    }

    #[test]
    fn with_forms_scope_after_spec() {
        let src = "(with-open-file (s path :direction :output) (write-line \"x\" s))";
        let t = table(src);
        let s = &t.collection(Collection::LocalSingleVariables)["s"][0];
        assert_eq!(s.scope.unwrap().slice(src), " (write-line \"x\" s)");
    }

    #[test]
    fn iterator_macros() {
        let t = table("(with-hash-table-iterator (next table) (next))");
        let next = &t.collection(Collection::LocalSingleVariables)["next"][0];
        assert_eq!(next.kind, BindingKind::LocalMacro);
    }

    #[test]
    fn dotimes() {
        let t = table("(dotimes (i 10) (print i))");
        assert!(t.collection(Collection::LocalSingleVariables).contains_key("i"));
    }
}
