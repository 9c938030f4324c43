//! Cross-cutting scenario and property tests (spec §8), kept as a dedicated sibling file
//! alongside `lib.rs` rather than folded into any one module's own `#[cfg(test)]` block, since
//! each scenario below exercises the full pipeline (lex → parse → lower → analyze) rather than
//! one pass in isolation.

use crate::diagnostics::DiagnosticCode;
use crate::element::{BindingKind, ElementKind, Literal, NumericType, TypeCheckOptions, TypeKind};
use crate::scope::Symbol;
use crate::session::{CompiledUnit, Session, SessionConfig};

fn compile(src: &str) -> CompiledUnit {
    let mut session = Session::new(SessionConfig::default());
    session.add_source("scenario.bc", src);
    session.run().unwrap().units.pop().unwrap()
}

fn numeric_type_of(unit: &CompiledUnit, name: &str) -> NumericType {
    let id = unit.scopes.find_identifier(unit.root_scope, &Symbol::plain(name)).expect("declared");
    let ty = unit.graph.get(id).inferred_type.expect("inferred type");
    match &unit.graph.get(ty).kind {
        ElementKind::Type(TypeKind::Numeric(n)) => *n,
        other => panic!("expected a numeric type, got {other:?}"),
    }
}

// Scenario 1: numeric narrowing (spec §8.1).
#[test]
fn scenario_numeric_narrowing() {
    let unit = compile("x := 42;\ny : s32 = 42;\nz : u8 = 300;\n");
    assert_eq!(numeric_type_of(&unit, "x"), NumericType::U8);
    assert_eq!(numeric_type_of(&unit, "y"), NumericType::S32);
    assert!(unit.diagnostics.iter().any(|d| d.code == DiagnosticCode::C052NarrowingOverflow));
}

// Scenario 2: constant folding across identifiers (spec §8.2).
#[test]
fn scenario_constant_folding_across_identifiers() {
    let unit = compile("a :: 2; b :: 3; c :: a * b + 1;\n");
    assert!(!unit.diagnostics.has_errors(), "{:?}", unit.diagnostics.iter().collect::<Vec<_>>());
    let c = unit.scopes.find_identifier(unit.root_scope, &Symbol::plain("c")).unwrap();
    let ElementKind::Binding(BindingKind::Identifier { init: Some(init), .. }) = &unit.graph.get(c).kind else {
        panic!("expected identifier");
    };
    match &unit.graph.get(*init).kind {
        ElementKind::Literal(Literal::Int(v)) => assert_eq!(*v, 7),
        other => panic!("expected folded literal, got {other:?}"),
    }
}

// Scenario 3: overload resolution (spec §8.3).
#[test]
fn scenario_overload_resolution_picks_by_argument_type() {
    let src = "foo :: proc(x: s32) {};\nfoo :: proc(x: f32) {};\na := foo(1);\nb := foo(1.0);\n";
    let unit = compile(src);
    assert!(!unit.diagnostics.has_errors(), "{:?}", unit.diagnostics.iter().collect::<Vec<_>>());

    let resolved_param_numeric = |name: &str| -> NumericType {
        let decl = unit.scopes.find_identifier(unit.root_scope, &Symbol::plain(name)).unwrap();
        let ElementKind::Binding(BindingKind::Identifier { init: Some(call), .. }) = &unit.graph.get(decl).kind else {
            panic!("expected identifier");
        };
        let ElementKind::Expr(crate::element::ExprKind::Call { resolved: Some(proc_ty), .. }) = &unit.graph.get(*call).kind
        else {
            panic!("expected a resolved call");
        };
        let ElementKind::Type(TypeKind::Procedure(p)) = &unit.graph.get(*proc_ty).kind else {
            panic!("expected a procedure type");
        };
        let ElementKind::Binding(BindingKind::Field { declared_type, .. }) = &unit.graph.get(p.params[0]).kind else {
            panic!("expected a field");
        };
        let ElementKind::Type(TypeKind::Numeric(n)) = &unit.graph.get(*declared_type).kind else {
            panic!("expected a numeric parameter");
        };
        *n
    };
    assert_eq!(resolved_param_numeric("a"), NumericType::S32);
    assert_eq!(resolved_param_numeric("b"), NumericType::F32);
}

#[test]
fn scenario_overload_resolution_reports_no_matching_overload_for_a_string_argument() {
    let src = "foo :: proc(x: s32) {};\nfoo :: proc(x: f32) {};\nc := foo(\"hi\");\n";
    let unit = compile(src);
    assert!(unit.diagnostics.iter().any(|d| d.code == DiagnosticCode::B020NoMatchingOverload));
}

// Scenario 4: uniform call syntax (spec §8.4).
#[test]
fn scenario_uniform_call_syntax_desugars_and_folds() {
    let src = "len :: proc(s: str): u32 { return 5; };\nn := \"hello\".len();\n";
    let unit = compile(src);
    assert!(!unit.diagnostics.has_errors(), "{:?}", unit.diagnostics.iter().collect::<Vec<_>>());
    let n = unit.scopes.find_identifier(unit.root_scope, &Symbol::plain("n")).unwrap();
    let ElementKind::Binding(BindingKind::Identifier { init: Some(call), .. }) = &unit.graph.get(n).kind else {
        panic!("expected identifier");
    };
    let ElementKind::Expr(crate::element::ExprKind::Call { args, resolved: Some(_), .. }) = &unit.graph.get(*call).kind
    else {
        panic!("expected a resolved call");
    };
    let ElementKind::Expr(crate::element::ExprKind::ArgList { args }) = &unit.graph.get(*args).kind else {
        panic!("expected an argument list");
    };
    assert_eq!(args.len(), 1, "`\"hello\".len()` desugars to a one-argument call");
    match &unit.graph.get(args[0]).kind {
        ElementKind::Literal(Literal::Str(s)) => assert_eq!(s, "hello"),
        other => panic!("expected the receiver string literal, got {other:?}"),
    }
}

// Scenario 5: `#if` selection (spec §8.5).
#[test]
fn scenario_if_directive_selects_exactly_one_branch() {
    let src = "DEBUG :: true;\n#if DEBUG {\nx := 1;\n} #else {\nx := 2;\n};\n";
    let unit = compile(src);
    assert!(!unit.diagnostics.has_errors(), "{:?}", unit.diagnostics.iter().collect::<Vec<_>>());
    let mut blocks = Vec::new();
    unit.scopes.visit_blocks(unit.root_scope, &mut |id| {
        blocks.push(id);
        true
    });
    let live_xs: Vec<_> =
        blocks.into_iter().filter_map(|b| unit.scopes.get(b).identifiers.get("x").copied()).collect();
    assert_eq!(live_xs.len(), 1, "exactly one live `x` across the surviving branch");
    let ElementKind::Binding(BindingKind::Identifier { init: Some(init), .. }) = &unit.graph.get(live_xs[0]).kind else {
        panic!("expected identifier");
    };
    match &unit.graph.get(*init).kind {
        ElementKind::Literal(Literal::Int(v)) => assert_eq!(*v, 1),
        other => panic!("expected folded literal `1`, got {other:?}"),
    }
}

// Scenario 6: ambiguous symbol (spec §8.6).
#[test]
fn scenario_ambiguous_call_site_reports_exactly_one_diagnostic() {
    let src = "foo :: proc(x: s32) {};\nfoo :: proc(x: s32) {};\ny := foo(1);\n";
    let unit = compile(src);
    let ambiguous: Vec<_> = unit.diagnostics.iter().filter(|d| d.code == DiagnosticCode::B021AmbiguousCallSite).collect();
    assert_eq!(ambiguous.len(), 1);
}

// Property: parent_scope chains reach the program root in bounded steps with no cycles.
#[test]
fn property_parent_scope_chains_reach_the_root_with_no_cycles() {
    let unit = compile("a :: 1;\nb :: proc(x: s32): s32 {\nc := x;\nreturn c;\n};\n");
    assert!(!unit.diagnostics.has_errors(), "{:?}", unit.diagnostics.iter().collect::<Vec<_>>());
    for id in unit.graph.ids() {
        let Some(mut scope) = unit.graph.get(id).parent_scope else { continue };
        let mut steps = 0;
        loop {
            if scope == unit.root_scope {
                break;
            }
            steps += 1;
            assert!(steps <= unit.scopes.len(), "parent_scope chain for {id:?} did not reach the root");
            scope = unit.scopes.get(scope).parent.expect("non-root block has a parent");
        }
    }
}

// Property: every identifier reference after resolution either resolves or is diagnosed.
#[test]
fn property_every_reference_resolves_or_is_diagnosed() {
    for src in ["x := y;\n", "a := 1;\nb := a;\n"] {
        let unit = compile(src);
        for el in unit.graph.iter() {
            if let ElementKind::Expr(crate::element::ExprKind::IdentRef { resolved: None, .. }) = &el.kind {
                assert!(
                    unit.diagnostics.has_errors(),
                    "unresolved reference with no diagnostic for input {src:?}"
                );
            }
        }
    }
}

// Property: folding a constant expression preserves its `as_X` value.
#[test]
fn property_folding_preserves_as_integer_value() {
    let unit = compile("a :: 10; b :: a + 5;\n");
    let b = unit.scopes.find_identifier(unit.root_scope, &Symbol::plain("b")).unwrap();
    let ElementKind::Binding(BindingKind::Identifier { init: Some(init), .. }) = &unit.graph.get(b).kind else {
        panic!("expected identifier");
    };
    let folded = unit.graph.get(*init).as_integer(&unit.graph);
    assert_eq!(folded, Some(15));
}

// Property: strict type-check implies lenient type-check for the same pair.
#[test]
fn property_strict_type_check_implies_lenient() {
    use crate::element::{type_check, ElementBuilder};
    let mut b = ElementBuilder::new();
    let span = crate::source::Span::new(crate::source::SourceId::new(0), 0, 1);
    let u32_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U32)), span);
    let u32_again = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U32)), span);
    let graph = b.graph();
    assert!(type_check(graph, u32_ty, u32_again, TypeCheckOptions::Strict));
    assert!(type_check(graph, u32_ty, u32_again, TypeCheckOptions::Lenient));
}

// Property: interning is idempotent — repeated lookups of the same name/pointee return the same id.
#[test]
fn property_type_interning_is_idempotent() {
    let unit = compile("x := 1;\n");
    let u8_first = unit.scopes.find_type(unit.root_scope, "u8");
    let u8_second = unit.scopes.find_type(unit.root_scope, "u8");
    assert_eq!(u8_first, u8_second);
    assert!(u8_first.is_some());

    let Some(u8_ty) = u8_first else { unreachable!() };
    let ptr_first = unit.scopes.find_pointer_type(u8_ty);
    assert_eq!(ptr_first, unit.scopes.find_pointer_type(u8_ty));
}
