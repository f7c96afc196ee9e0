//! The symbol table produced by the collector.

use std::sync::OnceLock;

use clscope_core::{RangeSet, TextRange};
use hashbrown::HashMap;

use crate::binding::Binding;

/// Bindings per lower-cased name, in insertion order.
pub type BindingMap = HashMap<String, Vec<Binding>>;

/// Which collection of the table a binding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    GlobalDefinitions,
    GlobalNamedLambdaParams,
    /// `flet`/`labels`/`macrolet` function names.
    LocalDefinitions,
    /// Parameters of local functions.
    LocalNamedLambdaParams,
    /// `let`-family, `do`-family, `lambda`, `destructuring-bind` and
    /// `multiple-value-bind` variables.
    LocalAnonymousLambdaParams,
    LocalSingleVariables,
    LocalLoopBindings,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::GlobalDefinitions,
        Collection::GlobalNamedLambdaParams,
        Collection::LocalDefinitions,
        Collection::LocalNamedLambdaParams,
        Collection::LocalAnonymousLambdaParams,
        Collection::LocalSingleVariables,
        Collection::LocalLoopBindings,
    ];

    /// Collections whose bindings carry a scope.
    pub const SCOPED: [Collection; 6] = [
        Collection::GlobalNamedLambdaParams,
        Collection::LocalDefinitions,
        Collection::LocalNamedLambdaParams,
        Collection::LocalAnonymousLambdaParams,
        Collection::LocalSingleVariables,
        Collection::LocalLoopBindings,
    ];
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    global_definitions: BindingMap,
    global_named_lambda_params: BindingMap,
    local_definitions: BindingMap,
    local_named_lambda_params: BindingMap,
    local_anonymous_lambda_params: BindingMap,
    local_single_variables: BindingMap,
    local_loop_bindings: BindingMap,
    step_forms: Vec<TextRange>,
    step_set: OnceLock<RangeSet>,
    all_local: OnceLock<BindingMap>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(&self, collection: Collection) -> &BindingMap {
        match collection {
            Collection::GlobalDefinitions => &self.global_definitions,
            Collection::GlobalNamedLambdaParams => &self.global_named_lambda_params,
            Collection::LocalDefinitions => &self.local_definitions,
            Collection::LocalNamedLambdaParams => &self.local_named_lambda_params,
            Collection::LocalAnonymousLambdaParams => &self.local_anonymous_lambda_params,
            Collection::LocalSingleVariables => &self.local_single_variables,
            Collection::LocalLoopBindings => &self.local_loop_bindings,
        }
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut BindingMap {
        match collection {
            Collection::GlobalDefinitions => &mut self.global_definitions,
            Collection::GlobalNamedLambdaParams => &mut self.global_named_lambda_params,
            Collection::LocalDefinitions => &mut self.local_definitions,
            Collection::LocalNamedLambdaParams => &mut self.local_named_lambda_params,
            Collection::LocalAnonymousLambdaParams => &mut self.local_anonymous_lambda_params,
            Collection::LocalSingleVariables => &mut self.local_single_variables,
            Collection::LocalLoopBindings => &mut self.local_loop_bindings,
        }
    }

    /// Register a binding. Derived views are reset.
    pub fn insert(&mut self, collection: Collection, binding: Binding) {
        self.all_local = OnceLock::new();
        self.collection_mut(collection)
            .entry(binding.name.clone())
            .or_default()
            .push(binding);
    }

    pub fn add_step_form(&mut self, range: TextRange) {
        self.step_set = OnceLock::new();
        self.step_forms.push(range);
    }

    /// Ranges of `do`/`do*` step expressions.
    pub fn step_forms(&self) -> &RangeSet {
        self.step_set
            .get_or_init(|| RangeSet::from_ranges(self.step_forms.iter().copied()))
    }

    pub fn globals(&self) -> &BindingMap {
        &self.global_definitions
    }

    /// The last global definition of `name`; later definitions win.
    pub fn global(&self, name: &str) -> Option<&Binding> {
        self.global_definitions.get(name).and_then(|defs| defs.last())
    }

    /// Every scoped binding, keyed by name. Computed on first use.
    pub fn all_local(&self) -> &BindingMap {
        self.all_local.get_or_init(|| {
            let mut merged = BindingMap::new();
            for collection in Collection::SCOPED {
                for (name, bindings) in self.collection(collection) {
                    merged
                        .entry(name.clone())
                        .or_default()
                        .extend(bindings.iter().cloned());
                }
            }
            merged
        })
    }

    pub fn locals(&self, name: &str) -> &[Binding] {
        self.all_local()
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All bindings in every collection.
    pub fn iter(&self) -> impl Iterator<Item = (Collection, &Binding)> + '_ {
        Collection::ALL.into_iter().flat_map(move |c| {
            self.collection(c)
                .values()
                .flatten()
                .map(move |b| (c, b))
        })
    }

    /// Global names plus every scoped binding visible at `offset`.
    pub fn visible_at(&self, offset: usize) -> Vec<&Binding> {
        let mut out: Vec<&Binding> = self
            .global_definitions
            .values()
            .filter_map(|defs| defs.last())
            .collect();
        out.extend(
            self.all_local()
                .values()
                .flatten()
                .filter(|b| b.is_visible_at(offset)),
        );
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.def_range.start.cmp(&b.def_range.start)));
        out
    }

    pub fn len(&self) -> usize {
        Collection::ALL
            .iter()
            .map(|c| self.collection(*c).values().map(Vec::len).sum::<usize>())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
