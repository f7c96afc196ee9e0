//! Position-sensitive name resolution.
//!
//! A name resolves to the innermost local binding whose scope contains the
//! position. When none does, it falls back to the global definition and
//! reports every local binding of the name as a potential shadow, so
//! consumers can drop occurrences that really belong to a local.

use clscope_core::TextRange;

use crate::binding::Binding;
use crate::table::SymbolTable;

/// The outcome of [`SymbolTable::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'t> {
    pub binding: Option<&'t Binding>,
    /// Local bindings that may shadow `binding` at other positions.
    pub shadow: &'t [Binding],
}

impl<'t> Resolution<'t> {
    fn found(binding: &'t Binding) -> Self {
        Resolution {
            binding: Some(binding),
            shadow: &[],
        }
    }
}

impl SymbolTable {
    /// Resolve `name` (lower-cased) written at `range`. `position` is `None`
    /// for references in a quoted context, where lexical scope does not
    /// apply.
    pub fn resolve(&self, name: &str, range: TextRange, position: Option<usize>) -> Resolution<'_> {
        let global = self.global(name);
        let locals = self.locals(name);
        let Some(position) = position else {
            return Resolution {
                binding: global,
                shadow: locals,
            };
        };
        if locals.is_empty() {
            return Resolution {
                binding: global,
                shadow: &[],
            };
        }

        let mut innermost: Option<&Binding> = None;
        for binding in locals {
            if binding.def_range == range {
                return Resolution::found(binding);
            }
            let Some(scope) = binding.scope else {
                continue;
            };
            if !scope.contains_inclusive(position) {
                continue;
            }
            if innermost.and_then(|b| b.scope).map_or(true, |s| scope.start >= s.start) {
                innermost = Some(binding);
            }
        }
        if let Some(binding) = innermost {
            return Resolution::found(binding);
        }

        if let Some(binding) = self.resolve_step_form(locals, position) {
            return Resolution::found(binding);
        }

        Resolution {
            binding: global,
            shadow: locals,
        }
    }

    /// `(do ((i 0 (1+ j)) (j 0 (1+ i))) ...)`: step forms see every
    /// variable of their `do`, including later ones.
    fn resolve_step_form<'t>(&self, locals: &'t [Binding], position: usize) -> Option<&'t Binding> {
        if !self.step_forms().contains(position) {
            return None;
        }
        locals
            .iter()
            .filter(|b| b.is_do_variable())
            .filter(|b| b.extended_scope.is_some_and(|w| w.contains(position)))
            .max_by_key(|b| b.extended_scope.map_or(0, |w| w.start))
    }
}

/// Check if an occurrence at `occurrence` belongs to one of the `shadow`
/// bindings rather than to the resolved global.
pub fn is_shadowed(occurrence: TextRange, shadow: &[Binding]) -> bool {
    shadow.iter().any(|b| {
        b.scope.is_some_and(|s| s.contains_inclusive(occurrence.start))
            || b.def_range.intersects(&occurrence)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingKind;
    use crate::table::Collection;

    fn let_var(name: &str, def: usize, scope: (usize, usize)) -> Binding {
        Binding::local(
            name.into(),
            TextRange::new(def, def + name.len()),
            BindingKind::LocalVariable,
            "let",
            TextRange::new(scope.0, scope.1),
            TextRange::new(def.saturating_sub(7), scope.1 + 1),
        )
    }

    fn table() -> SymbolTable {
        let mut t = SymbolTable::new();
        t.insert(
            Collection::GlobalDefinitions,
            Binding::global(
                "x".into(),
                TextRange::new(100, 101),
                BindingKind::Variable,
                TextRange::new(92, 110),
            ),
        );
        t.insert(Collection::LocalAnonymousLambdaParams, let_var("x", 7, (12, 60)));
        t.insert(Collection::LocalAnonymousLambdaParams, let_var("x", 25, (30, 50)));
        t
    }

    #[test]
    fn innermost_scope_wins() {
        let t = table();
        let r = t.resolve("x", TextRange::new(40, 41), Some(40));
        assert_eq!(r.binding.map(|b| b.def_range.start), Some(25));
        assert!(r.shadow.is_empty());

        let r = t.resolve("x", TextRange::new(55, 56), Some(55));
        assert_eq!(r.binding.map(|b| b.def_range.start), Some(7));
    }

    #[test]
    fn definition_site_short_circuits() {
        let t = table();
        // The inner definition lies inside the outer scope.
        let r = t.resolve("x", TextRange::new(25, 26), Some(25));
        assert_eq!(r.binding.map(|b| b.def_range.start), Some(25));
    }

    #[test]
    fn outside_locals_falls_back_to_global_with_shadow() {
        let t = table();
        let r = t.resolve("x", TextRange::new(105, 106), Some(105));
        assert_eq!(r.binding.map(|b| b.def_range.start), Some(100));
        assert_eq!(r.shadow.len(), 2);
        assert!(!is_shadowed(TextRange::new(105, 106), r.shadow));
        assert!(is_shadowed(TextRange::new(40, 41), r.shadow));
        assert!(is_shadowed(TextRange::new(7, 8), r.shadow));
    }

    #[test]
    fn quoted_context_has_no_position() {
        let t = table();
        let r = t.resolve("x", TextRange::new(40, 41), None);
        assert_eq!(r.binding.map(|b| b.def_range.start), Some(100));
        assert_eq!(r.shadow.len(), 2);
    }

    #[test]
    fn unknown_name() {
        let t = table();
        let r = t.resolve("nope", TextRange::new(0, 4), Some(0));
        assert!(r.binding.is_none());
        assert!(r.shadow.is_empty());
    }

    #[test]
    fn step_form_sees_later_do_variable() {
        let mut t = SymbolTable::new();
        // (do ((i 0 (1+ j)) (j 0 (1+ i))) ...)
        let j = Binding::local(
            "j".into(),
            TextRange::new(19, 20),
            BindingKind::LocalVariable,
            "do",
            TextRange::new(32, 40),
            TextRange::new(0, 41),
        )
        .with_extended_scope(TextRange::new(4, 32));
        t.insert(Collection::LocalAnonymousLambdaParams, j);
        t.add_step_form(TextRange::new(10, 16));

        let r = t.resolve("j", TextRange::new(14, 15), Some(14));
        assert_eq!(r.binding.map(|b| b.def_range.start), Some(19));

        // Outside step forms the window does not apply.
        let r = t.resolve("j", TextRange::new(8, 9), Some(8));
        assert!(r.binding.is_none());
    }
}
