use clscope_core::{AnalysisConfig, ExcludeMode};
use clscope_scope::analyze;
use proptest::prelude::*;

fn keyword() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "let", "let*", "do", "do*", "lambda", "flet", "labels", "macrolet", "loop", "dolist",
        "defun", "defmacro", "defmethod", "destructuring-bind", "multiple-value-bind", "for",
        "and", "with", "&optional", "&key", "&rest", "&aux", "x", "y", "z", "nil",
    ])
}

fn form(depth: u32) -> BoxedStrategy<String> {
    let leaf = prop_oneof![
        keyword().prop_map(str::to_string),
        (0u8..100).prop_map(|n| n.to_string()),
        Just("\"s\"".to_string()),
    ];
    if depth == 0 {
        return leaf.boxed();
    }
    prop_oneof![
        leaf,
        prop::collection::vec(form(depth - 1), 0..6).prop_map(|xs| format!("({})", xs.join(" "))),
        form(depth - 1).prop_map(|f| format!("'{f}")),
        form(depth - 1).prop_map(|f| format!("`(a ,{f})")),
    ]
    .boxed()
}

proptest! {
    #[test]
    fn analyze_never_panics(input in "\\PC*") {
        for mode in ExcludeMode::ALL {
            let a = analyze(&input, &AnalysisConfig::uniform(mode));
            for token in a.tokens() {
                let _ = a.binding_of(token);
            }
        }
    }

    #[test]
    fn local_resolutions_contain_the_position(src in prop::collection::vec(form(4), 1..4)) {
        let src = src.join("\n");
        let a = analyze(&src, &AnalysisConfig::default());
        let quoted = a.scanned().quoted_context();
        for token in a.tokens() {
            if quoted.contains(token.range.start) {
                continue;
            }
            let r = a.resolve_token(token);
            let Some(binding) = r.binding else { continue };
            let Some(scope) = binding.scope else { continue };
            let in_scope = scope.contains_inclusive(token.range.start);
            let at_definition = binding.def_range == token.range;
            let in_step_window = binding
                .extended_scope
                .is_some_and(|w| w.contains(token.range.start));
            prop_assert!(in_scope || at_definition || in_step_window);
        }
    }

    #[test]
    fn no_binding_inside_comments_or_strings(src in prop::collection::vec(form(3), 1..4)) {
        let src = src.join(" ; (let ((c 1)) c)\n");
        let a = analyze(&src, &AnalysisConfig::default());
        let comment_string = a.scanned().comment_string();
        for (_, binding) in a.table().iter() {
            prop_assert!(!comment_string.intersects(&binding.def_range));
        }
    }
}
