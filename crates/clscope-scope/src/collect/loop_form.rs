//! `loop` clause variables.

use clscope_reader::{Element, ElementKind, Pair};

use super::{scope_between, Collector};
use crate::binding::{Binding, BindingKind};
use crate::table::Collection;

/// Clause keywords that end a `for`/`as`/`with` chain, so a later `and`
/// no longer introduces a variable.
const CLAUSE_KEYWORDS: &[&str] = &[
    "do",
    "doing",
    "collect",
    "collecting",
    "append",
    "appending",
    "nconc",
    "nconcing",
    "count",
    "counting",
    "sum",
    "summing",
    "maximize",
    "maximizing",
    "minimize",
    "minimizing",
    "when",
    "if",
    "unless",
    "while",
    "until",
    "repeat",
    "always",
    "never",
    "thereis",
    "finally",
    "initially",
    "return",
    "else",
    "end",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Nothing,
    Variable,
    Name,
    Using,
}

impl Collector<'_> {
    pub(super) fn loop_form(&mut self, pair: Pair) {
        let mut expect = Expect::Nothing;
        let mut in_chain = false;
        for el in self.operands(pair) {
            match expect {
                Expect::Variable => {
                    self.bind_loop_target(&el, BindingKind::LoopVariable, pair);
                    expect = Expect::Nothing;
                    continue;
                }
                Expect::Name => {
                    self.bind_loop_target(&el, BindingKind::LoopName, pair);
                    expect = Expect::Nothing;
                    continue;
                }
                Expect::Using => {
                    // `using (hash-value v)`
                    if let Some(using) = el.group() {
                        if let Some(var) = self.elements(using).nth(1) {
                            self.bind_loop_target(&var, BindingKind::LoopVariable, pair);
                        }
                    }
                    expect = Expect::Nothing;
                    continue;
                }
                Expect::Nothing => {}
            }
            if !el.is_atom() {
                continue;
            }
            let word = el.text(self.text).to_ascii_lowercase();
            let word = word.strip_prefix(':').unwrap_or(&word);
            match word {
                "for" | "as" | "with" => {
                    in_chain = true;
                    expect = Expect::Variable;
                }
                "and" if in_chain => expect = Expect::Variable,
                "into" => expect = Expect::Variable,
                "named" => expect = Expect::Name,
                "using" => expect = Expect::Using,
                _ if CLAUSE_KEYWORDS.contains(&word) => in_chain = false,
                _ => {}
            }
        }
    }

    /// Bind a clause target; a parenthesized target destructures.
    fn bind_loop_target(&mut self, target: &Element, kind: BindingKind, loop_pair: Pair) {
        match target.kind {
            ElementKind::Atom => {
                let Some((name, def_range)) = self.symbol(target) else {
                    return;
                };
                let Some(scope) = scope_between(def_range.end, loop_pair.close) else {
                    return;
                };
                let binding =
                    Binding::local(name, def_range, kind, "loop", scope, loop_pair.range());
                self.push(Collection::LocalLoopBindings, binding);
            }
            ElementKind::Group(group) if !target.quoted => {
                for el in self.elements(group) {
                    self.bind_loop_target(&el, kind, loop_pair);
                }
            }
            _ => {}
        }
    }
}
