use clscope_core::TextRange;
use clscope_reader::{Element, ElementKind, Pair};

use super::Collector;
use crate::binding::{is_bindable, normalize_name, Binding};
use crate::forms::{GlobalForm, LambdaListShape};
use crate::table::Collection;

impl Collector<'_> {
    /// `(defun name (params) "doc" body)` and the other global definers.
    pub(super) fn global(&mut self, pair: Pair, form: GlobalForm) {
        let mut operands = self.operands(pair);
        let Some(name_el) = operands.next() else {
            return;
        };
        let Some((name, def_range)) = self.global_name(&name_el, form) else {
            tracing::trace!(at = pair.open, "definition without a usable name");
            return;
        };

        match form.lambda_list() {
            LambdaListShape::Ordinary | LambdaListShape::Destructuring => {
                let destructuring = form.lambda_list() == LambdaListShape::Destructuring;
                if let Some(params) = operands
                    .next()
                    .and_then(|el| self.lambda_list_at(&el, destructuring))
                {
                    self.push_params(Collection::GlobalNamedLambdaParams, &name, params, pair);
                }
            }
            LambdaListShape::Specialized => {
                // Method qualifiers (:before, :around, ...) precede the list.
                let list = operands.by_ref().find(|el| {
                    el.group().is_some() || el.text(self.text).eq_ignore_ascii_case("nil")
                });
                if let Some(params) = list.and_then(|el| self.lambda_list_at(&el, false)) {
                    self.push_params(Collection::GlobalNamedLambdaParams, &name, params, pair);
                }
            }
            LambdaListShape::Absent => match form {
                GlobalForm::Defsetf => self.defsetf(pair, &name, operands.clone()),
                GlobalForm::DefineMethodCombination => {
                    self.define_method_combination(pair, &name, operands.clone())
                }
                _ if form.has_init_value() => {
                    operands.next();
                }
                _ => {}
            },
        }

        let doc = if form.has_body() {
            self.body_doc_string(operands)
        } else {
            self.doc_string(operands)
        };
        let binding = Binding::global(name, def_range, form.kind(), pair.range()).with_doc(doc);
        self.push(Collection::GlobalDefinitions, binding);
    }

    /// The defined name: a symbol, `(setf name)` for function definers,
    /// `(name options)` for `defstruct`, or a package designator.
    fn global_name(&self, el: &Element, form: GlobalForm) -> Option<(String, TextRange)> {
        if el.quoted {
            return None;
        }
        let named = match el.kind {
            ElementKind::Atom if form == GlobalForm::Defpackage => {
                let raw = el.text(self.text);
                let stripped = raw
                    .strip_prefix("#:")
                    .or_else(|| raw.strip_prefix(':'))
                    .unwrap_or(raw);
                let name = normalize_name(stripped);
                (!name.is_empty()).then_some((name, el.range))
            }
            ElementKind::Str if form == GlobalForm::Defpackage => {
                let name = normalize_name(&self.string_value(el)?);
                (!name.is_empty()).then_some((name, el.range))
            }
            ElementKind::Atom => self.symbol(el),
            ElementKind::Group(spec) => {
                let mut parts = self.elements(spec);
                let first = parts.next()?;
                match form {
                    GlobalForm::Defun | GlobalForm::Defgeneric | GlobalForm::Defmethod => {
                        if !first.text(self.text).eq_ignore_ascii_case("setf") {
                            return None;
                        }
                        let accessor = parts.next()?;
                        self.symbol(&accessor)
                    }
                    GlobalForm::Defstruct | GlobalForm::DefineMethodCombination => {
                        self.symbol(&first)
                    }
                    _ => None,
                }
            }
            ElementKind::Str => None,
        };
        named.filter(|(name, _)| form == GlobalForm::Defpackage || is_bindable(name))
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

    fn globals(t: &SymbolTable) -> Vec<(String, BindingKind)> {
        let mut out: Vec<_> = t
            .globals()
            .values()
            .flatten()
            .map(|b| (b.name.clone(), b.kind))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    #[test]
    fn defun_with_params_and_doc() {
        let src = "(defun Area (w h) \"Compute area.\" (* w h))";
        let t = table(src);
        let f = t.global("area").unwrap();
        assert_eq!(f.kind, BindingKind::Function);
        assert_eq!(f.doc.as_deref(), Some("Compute area."));
        assert_eq!(f.def_range.slice(src), "Area");
        assert_eq!(f.form.start, 0);

        let params = t.collection(Collection::GlobalNamedLambdaParams);
        let w = &params["w"][0];
        assert_eq!(w.container.as_deref(), Some("area"));
        assert_eq!(w.kind, BindingKind::Parameter);
        assert_eq!(w.scope.map(|s| s.end), Some(src.len() - 1));
    }

    #[test]
    fn variables_take_doc_after_value() {
        let t = table("(defvar *a* \"value\" \"The doc.\") (defparameter *b* 1) (defconstant +c+ 2 \"C.\")");
        assert_eq!(t.global("*a*").unwrap().doc.as_deref(), Some("The doc."));
        assert_eq!(t.global("*b*").unwrap().doc, None);
        assert_eq!(t.global("+c+").unwrap().kind, BindingKind::Constant);
    }

    #[test]
    fn setf_function_names() {
        let t = table("(defun (setf thing) (new obj) new) (defmethod (setf other) (v (o foo)) v)");
        assert!(t.global("thing").is_some());
        assert_eq!(t.global("other").unwrap().kind, BindingKind::Method);
        let params = t.collection(Collection::GlobalNamedLambdaParams);
        assert!(params.contains_key("new"));
        assert!(params.contains_key("o"));
        assert!(!params.contains_key("foo"));
    }

    #[test]
    fn defmethod_qualifiers() {
        let t = table("(defmethod describe-it :around ((x widget) &optional y) (call-next-method))");
        let params = t.collection(Collection::GlobalNamedLambdaParams);
        assert!(params.contains_key("x"));
        assert!(params.contains_key("y"));
        assert!(!params.contains_key("widget"));
    }

    #[test]
    fn classes_structs_and_packages() {
        let src = "(defclass point () ((x :initarg :x)) (:documentation \"A point.\"))\n\
                   (defstruct (node (:conc-name n-)) left right)\n\
                   (define-condition oops (error) ())\n\
                   (defpackage #:My-Pkg (:use :cl))\n\
                   (deftype octet () '(unsigned-byte 8))";
        let t = table(src);
        assert_eq!(
            globals(&t),
            vec![
                ("my-pkg".to_string(), BindingKind::Package),
                ("node".to_string(), BindingKind::Struct),
                ("octet".to_string(), BindingKind::Type),
                ("oops".to_string(), BindingKind::Condition),
                ("point".to_string(), BindingKind::Class),
            ]
        );
        assert_eq!(t.global("point").unwrap().doc.as_deref(), Some("A point."));
    }

    #[test]
    fn defgeneric_documentation_option() {
        let t = table("(defgeneric area (shape) (:documentation \"Area of SHAPE.\"))");
        assert_eq!(t.global("area").unwrap().doc.as_deref(), Some("Area of SHAPE."));
        assert_eq!(t.global("area").unwrap().kind, BindingKind::GenericFunction);
    }

    #[test]
    fn macro_lambda_list_destructures() {
        let t = table("(defmacro with-pair ((a b) pair &body body) `(destructuring-bind (,a ,b) ,pair ,@body))");
        let params = t.collection(Collection::GlobalNamedLambdaParams);
        for name in ["a", "b", "pair", "body"] {
            assert!(params.contains_key(name), "{name}");
        }
    }

    #[test]
    fn duplicate_definitions_keep_both() {
        let t = table("(defun f () 1)\n(defun f () 2)");
        assert_eq!(t.globals()["f"].len(), 2);
        assert_eq!(t.global("f").unwrap().def_range.start, 22);
    }

    #[test]
    fn definitions_in_comments_and_strings_are_ignored() {
        let t = table(";; (defun hidden ())\n\"(defun also-hidden ())\" (defun shown ())");
        assert_eq!(globals(&t), vec![("shown".to_string(), BindingKind::Function)]);
    }

    #[test]
    fn nil_lambda_list() {
        let t = table("(defun f nil 1)");
        assert!(t.global("f").is_some());
        assert!(t.collection(Collection::GlobalNamedLambdaParams).is_empty());
    }

    #[test]
    fn escaped_doc_string() {
        let t = table(r#"(defun f () "Say \"hi\"." 1)"#);
        assert_eq!(t.global("f").unwrap().doc.as_deref(), Some("Say \"hi\"."));
    }
}
