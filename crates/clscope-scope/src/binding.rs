use std::fmt;

use clscope_core::TextRange;

/// What a binding names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Function,
    Macro,
    CompilerMacro,
    GenericFunction,
    Method,
    ModifyMacro,
    SetfExpander,
    MethodCombination,
    Variable,
    Constant,
    SymbolMacro,
    Class,
    Condition,
    Struct,
    Type,
    Package,
    Parameter,
    LocalVariable,
    LocalFunction,
    LocalMacro,
    LocalSymbolMacro,
    LoopVariable,
    LoopName,
}

impl BindingKind {
    /// Kinds that can appear in operator position and take part in the
    /// call hierarchy.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            BindingKind::Function
                | BindingKind::Macro
                | BindingKind::CompilerMacro
                | BindingKind::GenericFunction
                | BindingKind::Method
                | BindingKind::ModifyMacro
        )
    }

    pub fn is_local_function(self) -> bool {
        matches!(self, BindingKind::LocalFunction | BindingKind::LocalMacro)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BindingKind::Function => "function",
            BindingKind::Macro => "macro",
            BindingKind::CompilerMacro => "compiler-macro",
            BindingKind::GenericFunction => "generic-function",
            BindingKind::Method => "method",
            BindingKind::ModifyMacro => "modify-macro",
            BindingKind::SetfExpander => "setf-expander",
            BindingKind::MethodCombination => "method-combination",
            BindingKind::Variable => "variable",
            BindingKind::Constant => "constant",
            BindingKind::SymbolMacro => "symbol-macro",
            BindingKind::Class => "class",
            BindingKind::Condition => "condition",
            BindingKind::Struct => "struct",
            BindingKind::Type => "type",
            BindingKind::Package => "package",
            BindingKind::Parameter => "parameter",
            BindingKind::LocalVariable => "local-variable",
            BindingKind::LocalFunction => "local-function",
            BindingKind::LocalMacro => "local-macro",
            BindingKind::LocalSymbolMacro => "local-symbol-macro",
            BindingKind::LoopVariable => "loop-variable",
            BindingKind::LoopName => "loop-name",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single definition of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Lower-cased name.
    pub name: String,
    /// The introducing form (`"let"`, `"do"`, ...) for anonymous binding
    /// forms, the defining name for parameters of named functions, `None`
    /// for global definitions.
    pub container: Option<String>,
    /// Where the binding is visible; `None` for global definitions.
    pub scope: Option<TextRange>,
    /// The name as written at the definition site.
    pub def_range: TextRange,
    pub kind: BindingKind,
    /// The whole introducing form (for local functions and their
    /// parameters, the function's own definition).
    pub form: TextRange,
    /// `do`/`do*` variables only: from the variable group's opening bracket
    /// up to the normal scope start. Step forms inside it see the variable.
    pub extended_scope: Option<TextRange>,
    pub doc: Option<String>,
}

impl Binding {
    pub fn global(name: String, def_range: TextRange, kind: BindingKind, form: TextRange) -> Self {
        Binding {
            name,
            container: None,
            scope: None,
            def_range,
            kind,
            form,
            extended_scope: None,
            doc: None,
        }
    }

    pub fn local(
        name: String,
        def_range: TextRange,
        kind: BindingKind,
        container: impl Into<String>,
        scope: TextRange,
        form: TextRange,
    ) -> Self {
        Binding {
            name,
            container: Some(container.into()),
            scope: Some(scope),
            def_range,
            kind,
            form,
            extended_scope: None,
            doc: None,
        }
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub fn with_extended_scope(mut self, extended: TextRange) -> Self {
        self.extended_scope = Some(extended);
        self
    }

    pub fn is_global(&self) -> bool {
        self.scope.is_none()
    }

    /// Check if `offset` is inside this binding's scope (inclusive end).
    pub fn is_visible_at(&self, offset: usize) -> bool {
        self.scope.is_some_and(|s| s.contains_inclusive(offset))
    }

    /// Check if `other` is the same definition, possibly a copy from another
    /// view of the table.
    pub fn same_definition(&self, other: &Binding) -> bool {
        self.name == other.name && self.def_range == other.def_range && self.kind == other.kind
    }

    /// Whether this binding was introduced by `do` or `do*`.
    pub fn is_do_variable(&self) -> bool {
        matches!(self.container.as_deref(), Some("do" | "do*"))
    }
}

/// Normalize a symbol name for table lookups.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Check if `name` can be bound as a variable or function name.
/// `nil`, `t`, keywords, numbers and lambda-list markers never are.
pub fn is_bindable(name: &str) -> bool {
    !name.is_empty()
        && name != "nil"
        && name != "t"
        && name != "."
        && !name.starts_with(':')
        && !name.starts_with('&')
        && !clscope_reader::chars::looks_numeric(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindable_names() {
        assert!(is_bindable("x"));
        assert!(is_bindable("*special*"));
        assert!(is_bindable("1+"));
        assert!(!is_bindable("nil"));
        assert!(!is_bindable("t"));
        assert!(!is_bindable(":key"));
        assert!(!is_bindable("&optional"));
        assert!(!is_bindable("42"));
    }

    #[test]
    fn visibility_uses_inclusive_end() {
        let b = Binding::local(
            "x".into(),
            TextRange::new(7, 8),
            BindingKind::LocalVariable,
            "let",
            TextRange::new(12, 20),
            TextRange::new(0, 21),
        );
        assert!(!b.is_visible_at(11));
        assert!(b.is_visible_at(12));
        assert!(b.is_visible_at(20));
        assert!(!b.is_visible_at(21));
        assert!(!b.is_global());
    }

    #[test]
    fn do_container() {
        let b = Binding::local(
            "i".into(),
            TextRange::new(0, 1),
            BindingKind::LocalVariable,
            "do*",
            TextRange::new(2, 3),
            TextRange::new(0, 4),
        );
        assert!(b.is_do_variable());
    }
}
