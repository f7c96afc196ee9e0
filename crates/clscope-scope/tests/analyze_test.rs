mod common;

use clscope_core::{AnalysisConfig, ExcludeMode, TextRange};
use clscope_reader::scan;
use clscope_scope::{analyze, parse_lambda_list, BindingKind, Collection};
use common::{analyze_default, def_of, nth};

// ============================================================
// Innermost scope and shadowing
// ============================================================

#[test]
fn innermost_binding_wins() {
    let src = "(let ((x 1)) (let ((x 2)) x))";
    let a = analyze_default(src);
    let inner_def = nth(src, "x", 1);
    assert_eq!(def_of(&a, nth(src, "x", 2)), Some(inner_def));
}

#[test]
fn outer_references_exclude_shadowed_occurrences() {
    let src = "(let ((x 1)) (print x) (let ((x 2)) (print x)))";
    let a = analyze_default(src);
    let outer = a
        .table()
        .locals("x")
        .iter()
        .find(|b| b.def_range.start == nth(src, "x", 0))
        .unwrap()
        .clone();
    let refs = a.occurrences_of(&outer, ExcludeMode::CommentString);
    assert_eq!(
        refs,
        vec![
            TextRange::new(nth(src, "x", 0), nth(src, "x", 0) + 1),
            TextRange::new(nth(src, "x", 1), nth(src, "x", 1) + 1),
        ]
    );
}

#[test]
fn global_references_skip_local_shadows() {
    let src = "(defvar *n* 1)\n(defun f (*n*) *n*)\n(print *n*)";
    let a = analyze_default(src);
    let global = a.table().global("*n*").unwrap().clone();
    let refs = a.occurrences_of(&global, ExcludeMode::CommentString);
    let starts: Vec<_> = refs.iter().map(|r| r.start).collect();
    assert_eq!(starts, vec![nth(src, "*n*", 0), nth(src, "*n*", 3)]);
}

#[test]
fn resolved_positions_lie_in_scope() {
    let src = "(defun f (a &optional (b a))\n  (let* ((c b) (d c))\n    (dolist (e (list a b c d) e)\n      (loop for g in e collect (+ g d)))))";
    let a = analyze_default(src);
    let mut checked = 0;
    for token in a.tokens() {
        let Some(binding) = a.binding_of(token) else {
            continue;
        };
        if let Some(scope) = binding.scope {
            if binding.def_range != token.range {
                assert!(
                    scope.start <= token.range.start && token.range.start <= scope.end,
                    "{} at {} outside {}",
                    token.name,
                    token.range,
                    scope
                );
                checked += 1;
            }
        }
    }
    assert!(checked >= 10, "only {checked} local references resolved");
}

// ============================================================
// Sequential and parallel binding
// ============================================================

#[test]
fn let_star_sees_earlier_sibling() {
    let src = "(let* ((a 1) (b a)) b)";
    let a = analyze_default(src);
    assert_eq!(def_of(&a, nth(src, "a", 1)), Some(nth(src, "a", 0)));
}

#[test]
fn let_does_not_see_sibling() {
    let src = "(let ((a 1) (b a)) b)";
    let a = analyze_default(src);
    assert_eq!(def_of(&a, nth(src, "a", 1)), None);
    assert_eq!(def_of(&a, nth(src, "b", 1)), Some(nth(src, "b", 0)));
}

#[test]
fn let_init_form_sees_outer_binding() {
    let src = "(let ((x 1)) (let ((x (1+ x))) x))";
    let a = analyze_default(src);
    assert_eq!(def_of(&a, nth(src, "x", 2)), Some(nth(src, "x", 0)));
    assert_eq!(def_of(&a, nth(src, "x", 3)), Some(nth(src, "x", 1)));
}

#[test]
fn flet_body_sees_outer_function_labels_sees_itself() {
    let src = "(defun f () 0)\n(flet ((f () (f))) (f))\n(labels ((g () (g))) (g))";
    let a = analyze_default(src);
    let global_f = nth(src, "f ()", 0);
    let local_f = nth(src, "f ()", 1);
    // Inside the flet definition `f` is still the global function.
    assert_eq!(def_of(&a, nth(src, "(f)", 0) + 1), Some(global_f));
    assert_eq!(def_of(&a, nth(src, "(f)", 1) + 1), Some(local_f));
    assert_eq!(def_of(&a, nth(src, "(g)", 0) + 1), Some(nth(src, "g ()", 0)));
}

#[test]
fn labels_siblings_call_each_other() {
    let src = "(labels ((ev (n) (if (zerop n) t (od (1- n))))\n         (od (n) (ev (1- n))))\n  (ev 4))";
    let a = analyze_default(src);
    let ev = nth(src, "ev", 0);
    let od = nth(src, "od", 1);
    // An earlier definition sees a later sibling.
    assert_eq!(def_of(&a, nth(src, "od", 0)), Some(od));
    assert_eq!(def_of(&a, nth(src, "ev", 1)), Some(ev));
    assert_eq!(def_of(&a, nth(src, "ev", 2)), Some(ev));
}

#[test]
fn destructuring_bind_value_form_sees_new_bindings() {
    let src = "(let ((a 1)) (destructuring-bind (a) (list a) a))";
    let a = analyze_default(src);
    let inner = nth(src, "a", 1);
    assert_eq!(def_of(&a, nth(src, "a", 2)), Some(inner));
    assert_eq!(def_of(&a, nth(src, "a", 3)), Some(inner));
}

#[test]
fn multiple_value_bind_value_form_sees_new_bindings() {
    let src = "(multiple-value-bind (q r) (floor q 2) (list q r))";
    let a = analyze_default(src);
    assert_eq!(def_of(&a, nth(src, "q", 1)), Some(nth(src, "q", 0)));
}

// ============================================================
// do step forms
// ============================================================

#[test]
fn do_step_forms_see_all_variables() {
    let src = "(do ((i 0 (1+ j)) (j 0 (1+ i))) ((> i 9)) (print j))";
    let a = analyze_default(src);
    let i_def = nth(src, "i", 0);
    let j_def = nth(src, "j", 1);
    assert_eq!(def_of(&a, nth(src, "j", 0)), Some(j_def));
    assert_eq!(def_of(&a, nth(src, "i", 1)), Some(i_def));
    assert_eq!(def_of(&a, nth(src, "i", 2)), Some(i_def));
    assert_eq!(def_of(&a, nth(src, "j", 2)), Some(j_def));
}

#[test]
fn do_init_forms_do_not_see_variables() {
    let src = "(do ((i 0 (1+ i)) (j i (1+ j))) (t))";
    let a = analyze_default(src);
    // `i` as j's init form is evaluated before any binding exists.
    assert_eq!(def_of(&a, nth(src, "i", 2)), None);
}

#[test]
fn do_star_binds_sequentially() {
    let src = "(do* ((i 0 (1+ i)) (j i (1+ j))) (t))";
    let a = analyze_default(src);
    assert_eq!(def_of(&a, nth(src, "i", 2)), Some(nth(src, "i", 0)));
}

// ============================================================
// Duplicates, destructuring, end to end
// ============================================================

#[test]
fn later_duplicate_definition_wins() {
    let src = "(defun f () 1)\n(defun f () 2)";
    let a = analyze_default(src);
    let r = a
        .table()
        .resolve("f", TextRange::new(100, 101), None);
    assert_eq!(r.binding.map(|b| b.def_range.start), Some(nth(src, "f ()", 1)));
    assert_eq!(a.table().globals()["f"].len(), 2);
}

#[test]
fn destructuring_lambda_list() {
    let src = "(a (b &optional c) &key (d 0 d-p))";
    let s = scan(src);
    let names: Vec<_> = parse_lambda_list(src, &s, 0, true)
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["a", "b", "c", "d", "d-p"]);
}

#[test]
fn end_to_end_two_functions() {
    let src = "(defun f (x) (+ x 1))\n(defun g () (f 2))";
    let a = analyze_default(src);
    let table = a.table();

    let f = table.global("f").unwrap();
    assert_eq!(f.kind, BindingKind::Function);
    assert_eq!(f.def_range, TextRange::new(7, 8));
    assert!(table.global("g").is_some());

    let x = &table.collection(Collection::GlobalNamedLambdaParams)["x"][0];
    assert_eq!(x.container.as_deref(), Some("f"));
    assert_eq!(def_of(&a, nth(src, "x", 1)), Some(nth(src, "x", 0)));

    // `f` inside g's body is the global f, and x is not visible there.
    assert_eq!(def_of(&a, nth(src, "(f 2)", 0) + 1), Some(7));
    let names: Vec<_> = a
        .bindings_at(nth(src, "(f 2)", 0))
        .iter()
        .map(|b| b.name.clone())
        .collect();
    assert_eq!(names, vec!["f", "g"]);
}

// ============================================================
// Exclusion ranges
// ============================================================

#[test]
fn nothing_is_collected_from_comments_or_strings() {
    let src = "(defun f ()\n  ; (let ((z 1)) z)\n  #| (flet ((h () 1)) (h)) |#\n  \"(let ((w 1)) w)\"\n  1)";
    let a = analyze_default(src);
    let comment_string = a.scanned().comment_string().clone();
    for (_, binding) in a.table().iter() {
        assert!(
            !comment_string.intersects(&binding.def_range),
            "{} defined inside a comment or string",
            binding.name
        );
    }
    assert!(a.table().locals("z").is_empty());
    assert!(a.table().locals("h").is_empty());
    assert!(a.table().locals("w").is_empty());
}

#[test]
fn quoted_forms_follow_the_static_mode() {
    let src = "(defmacro m () `(let ((q 1)) ,(let ((u 2)) u) q))";
    let excluded = analyze(src, &AnalysisConfig::default());
    assert!(excluded.table().locals("q").is_empty());
    assert_eq!(excluded.table().locals("u").len(), 1);

    let included = analyze(src, &AnalysisConfig::uniform(ExcludeMode::CommentString));
    assert_eq!(included.table().locals("q").len(), 1);
}

#[test]
fn quoted_data_inside_comma_stays_excluded() {
    let src = "(defmacro m () `(a ,(f '(let ((z 1)) z)) ,(let ((u 2)) u)))";
    let a = analyze_default(src);
    assert!(a.table().locals("z").is_empty());
    assert_eq!(a.table().locals("u").len(), 1);
}

#[test]
fn reader_dispatch_letters_are_not_references() {
    let src = "(let ((c 1) (p 2)) (list c p #c(1 2) #p\"/tmp\" #x1F))";
    let a = analyze_default(src);
    assert!(a.token_at(nth(src, "#c", 0) + 1).is_none());
    assert!(a.token_at(nth(src, "#p", 0) + 1).is_none());
    assert!(a.token_at(nth(src, "#x", 0) + 1).is_none());
    for name in ["c", "p"] {
        let binding = a.table().locals(name)[0].clone();
        let refs = a.occurrences_of(&binding, ExcludeMode::CommentString);
        assert_eq!(refs.len(), 2, "{name}: {refs:?}");
    }
}

#[test]
fn unbalanced_input_degrades_gracefully() {
    let src = "(defun f (x) (let ((y x)) y)\n(defun g (\"unterminated";
    let a = analyze_default(src);
    // The outer defun never closes, so only inner forms are collected.
    assert!(a.table().global("f").is_none());
    assert_eq!(a.table().locals("y").len(), 1);
}
