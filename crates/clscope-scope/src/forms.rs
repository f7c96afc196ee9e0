//! Recognized form heads.

use crate::binding::BindingKind;

/// Definition forms at top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalForm {
    Defun,
    Defmacro,
    DefineCompilerMacro,
    Defgeneric,
    Defmethod,
    Defsetf,
    DefineSetfExpander,
    Deftype,
    DefineModifyMacro,
    DefineMethodCombination,
    Defvar,
    Defparameter,
    Defconstant,
    DefineSymbolMacro,
    Defclass,
    DefineCondition,
    Defstruct,
    Defpackage,
}

/// How a global form's lambda list is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaListShape {
    /// No lambda list.
    Absent,
    Ordinary,
    /// Macro-style lambda list; nested groups destructure.
    Destructuring,
    /// `defmethod`: qualifiers, then a specialized lambda list.
    Specialized,
}

impl GlobalForm {
    pub fn kind(self) -> BindingKind {
        match self {
            GlobalForm::Defun => BindingKind::Function,
            GlobalForm::Defmacro => BindingKind::Macro,
            GlobalForm::DefineCompilerMacro => BindingKind::CompilerMacro,
            GlobalForm::Defgeneric => BindingKind::GenericFunction,
            GlobalForm::Defmethod => BindingKind::Method,
            GlobalForm::Defsetf | GlobalForm::DefineSetfExpander => BindingKind::SetfExpander,
            GlobalForm::Deftype => BindingKind::Type,
            GlobalForm::DefineModifyMacro => BindingKind::ModifyMacro,
            GlobalForm::DefineMethodCombination => BindingKind::MethodCombination,
            GlobalForm::Defvar | GlobalForm::Defparameter => BindingKind::Variable,
            GlobalForm::Defconstant => BindingKind::Constant,
            GlobalForm::DefineSymbolMacro => BindingKind::SymbolMacro,
            GlobalForm::Defclass => BindingKind::Class,
            GlobalForm::DefineCondition => BindingKind::Condition,
            GlobalForm::Defstruct => BindingKind::Struct,
            GlobalForm::Defpackage => BindingKind::Package,
        }
    }

    pub fn lambda_list(self) -> LambdaListShape {
        match self {
            GlobalForm::Defun
            | GlobalForm::Defgeneric
            | GlobalForm::DefineModifyMacro => LambdaListShape::Ordinary,
            GlobalForm::Defmacro
            | GlobalForm::DefineCompilerMacro
            | GlobalForm::DefineSetfExpander
            | GlobalForm::Deftype => LambdaListShape::Destructuring,
            GlobalForm::Defmethod => LambdaListShape::Specialized,
            // defsetf and define-method-combination have their own layouts.
            _ => LambdaListShape::Absent,
        }
    }

    /// Forms with a function body, where a doc string must precede the
    /// first body form and must not be the last one.
    pub fn has_body(self) -> bool {
        matches!(
            self,
            GlobalForm::Defun
                | GlobalForm::Defmacro
                | GlobalForm::DefineCompilerMacro
                | GlobalForm::Defmethod
                | GlobalForm::DefineSetfExpander
                | GlobalForm::Deftype
        )
    }

    /// Forms whose doc string follows an init value: `(defvar name value doc)`.
    pub fn has_init_value(self) -> bool {
        matches!(
            self,
            GlobalForm::Defvar
                | GlobalForm::Defparameter
                | GlobalForm::Defconstant
                | GlobalForm::DefineSymbolMacro
        )
    }
}

/// Local functions: `flet`, `labels`, `macrolet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFunctionForm {
    Flet,
    Labels,
    Macrolet,
}

/// Forms binding one variable from a binding list: `(dolist (x list) ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleVarForm {
    /// The binding list's second element is evaluated before the result form, which
    /// sees the variable (`dolist`, `dotimes`, `do-symbols`, ...).
    pub iterates: bool,
    pub kind: BindingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormHead {
    Global(GlobalForm),
    /// `let`-style binding list. `sequential` for the starred variants.
    LetLike { sequential: bool, kind: BindingKind },
    Do { sequential: bool },
    Lambda,
    DestructuringBind,
    MultipleValueBind,
    LocalFunctions(LocalFunctionForm),
    SingleVar(SingleVarForm),
    Loop,
}

/// Collector passes, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Global,
    LocalBinding,
    LocalFunction,
    SingleVariable,
    Loop,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Global,
        Category::LocalBinding,
        Category::LocalFunction,
        Category::SingleVariable,
        Category::Loop,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl FormHead {
    pub fn category(self) -> Category {
        match self {
            FormHead::Global(_) => Category::Global,
            FormHead::LetLike { .. }
            | FormHead::Do { .. }
            | FormHead::Lambda
            | FormHead::DestructuringBind
            | FormHead::MultipleValueBind => Category::LocalBinding,
            FormHead::LocalFunctions(_) => Category::LocalFunction,
            FormHead::SingleVar(_) => Category::SingleVariable,
            FormHead::Loop => Category::Loop,
        }
    }
}

/// Strip a `cl:` / `common-lisp:` package prefix from a lower-cased head.
pub fn strip_cl_prefix(head: &str) -> &str {
    for prefix in ["common-lisp::", "common-lisp:", "cl::", "cl:"] {
        if let Some(rest) = head.strip_prefix(prefix) {
            return rest;
        }
    }
    head
}

/// Classify the first token of a form.
pub fn classify(head: &str) -> Option<FormHead> {
    let lower = head.to_ascii_lowercase();
    let single = |iterates, kind| FormHead::SingleVar(SingleVarForm { iterates, kind });
    let head = match strip_cl_prefix(&lower) {
        // ── Global definitions ───────────────────────────────────
        "defun" => FormHead::Global(GlobalForm::Defun),
        "defmacro" => FormHead::Global(GlobalForm::Defmacro),
        "define-compiler-macro" => FormHead::Global(GlobalForm::DefineCompilerMacro),
        "defgeneric" => FormHead::Global(GlobalForm::Defgeneric),
        "defmethod" => FormHead::Global(GlobalForm::Defmethod),
        "defsetf" => FormHead::Global(GlobalForm::Defsetf),
        "define-setf-expander" => FormHead::Global(GlobalForm::DefineSetfExpander),
        "deftype" => FormHead::Global(GlobalForm::Deftype),
        "define-modify-macro" => FormHead::Global(GlobalForm::DefineModifyMacro),
        "define-method-combination" => FormHead::Global(GlobalForm::DefineMethodCombination),
        "defvar" => FormHead::Global(GlobalForm::Defvar),
        "defparameter" => FormHead::Global(GlobalForm::Defparameter),
        "defconstant" => FormHead::Global(GlobalForm::Defconstant),
        "define-symbol-macro" => FormHead::Global(GlobalForm::DefineSymbolMacro),
        "defclass" => FormHead::Global(GlobalForm::Defclass),
        "define-condition" => FormHead::Global(GlobalForm::DefineCondition),
        "defstruct" => FormHead::Global(GlobalForm::Defstruct),
        "defpackage" => FormHead::Global(GlobalForm::Defpackage),

        // ── Local binding forms ──────────────────────────────────
        "let" | "prog" => FormHead::LetLike {
            sequential: false,
            kind: BindingKind::LocalVariable,
        },
        "let*" | "prog*" => FormHead::LetLike {
            sequential: true,
            kind: BindingKind::LocalVariable,
        },
        "symbol-macrolet" => FormHead::LetLike {
            sequential: false,
            kind: BindingKind::LocalSymbolMacro,
        },
        "do" => FormHead::Do { sequential: false },
        "do*" => FormHead::Do { sequential: true },
        "lambda" => FormHead::Lambda,
        "destructuring-bind" => FormHead::DestructuringBind,
        "multiple-value-bind" => FormHead::MultipleValueBind,

        // ── Local functions ──────────────────────────────────────
        "flet" => FormHead::LocalFunctions(LocalFunctionForm::Flet),
        "labels" => FormHead::LocalFunctions(LocalFunctionForm::Labels),
        "macrolet" => FormHead::LocalFunctions(LocalFunctionForm::Macrolet),

        // ── Single-variable forms ────────────────────────────────
        "dolist" | "dotimes" | "do-symbols" | "do-external-symbols" | "do-all-symbols" => {
            single(true, BindingKind::LocalVariable)
        }
        "with-open-file"
        | "with-open-stream"
        | "with-input-from-string"
        | "with-output-to-string" => single(false, BindingKind::LocalVariable),
        "with-hash-table-iterator" | "with-package-iterator" => {
            single(false, BindingKind::LocalMacro)
        }

        "loop" => FormHead::Loop,
        _ => return None,
    };
    Some(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_case_insensitively() {
        assert_eq!(classify("DEFUN"), Some(FormHead::Global(GlobalForm::Defun)));
        assert_eq!(classify("Let*").map(FormHead::category), Some(Category::LocalBinding));
    }

    #[test]
    fn strips_cl_prefixes() {
        assert_eq!(classify("cl:loop"), Some(FormHead::Loop));
        assert_eq!(
            classify("common-lisp:flet"),
            Some(FormHead::LocalFunctions(LocalFunctionForm::Flet))
        );
        assert_eq!(classify("other:loop"), None);
    }

    #[test]
    fn unknown_heads() {
        assert_eq!(classify("foo"), None);
        assert_eq!(classify("define"), None);
    }

    #[test]
    fn category_order() {
        let idx: Vec<_> = Category::ALL.iter().map(|c| c.index()).collect();
        assert_eq!(idx, vec![0, 1, 2, 3, 4]);
    }
}
