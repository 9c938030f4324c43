//! Pass 5: constant folding (spec §4.7 pass 5, spec §4.6 fold policy) — replaces every foldable
//! non-literal element with a fresh [`Literal`] element carrying its computed value, and patches
//! whichever field of its parent pointed at the original element to point at the new one instead.
//!
//! Element ids are allocated in strict bottom-up post-order during lowering (a `Binary`'s `lhs`/
//! `rhs` always get lower ids than the `Binary` itself), so one ascending sweep over
//! `ElementGraph::ids()` already visits every child before its parent — by the time a parent is
//! reached, its already-constant children have already folded down to literals, which is what
//! makes `a * b + 1` converge in a single pass instead of needing its own fixpoint loop.
//!
//! No element is ever removed from the arena (spec §3's lifecycle invariant): folding allocates a
//! new element and rewrites the reference to it, it never deletes the element being replaced.

use crate::element::{BinaryOp, Element, ElementGraph, ElementId, ElementKind, ExprKind, Literal, UnaryOp};

pub(super) fn run(graph: &mut ElementGraph) -> u32 {
    let mut folded = 0;
    for id in graph.ids().collect::<Vec<_>>() {
        if matches!(graph.get(id).kind, ElementKind::Literal(_)) {
            continue;
        }
        if !graph.get(id).can_fold(graph) {
            continue;
        }
        let Some(literal) = literal_value(graph, id) else { continue };
        let el = graph.get(id);
        let (parent_scope, parent, module, span, inferred_type) =
            (el.parent_scope, el.parent, el.module, el.span, el.inferred_type);
        let new_id = graph.next_id();
        graph.alloc(Element {
            id: new_id,
            kind: ElementKind::Literal(literal),
            parent_scope,
            parent,
            module,
            span,
            inferred_type,
            no_fold: false,
        });
        if let Some(p) = parent {
            replace_child(graph, p, id, new_id);
        }
        folded += 1;
    }
    folded
}

fn literal_value(graph: &ElementGraph, id: ElementId) -> Option<Literal> {
    let el = graph.get(id).clone();
    match &el.kind {
        ElementKind::Expr(ExprKind::Unary { op, operand }) => fold_unary(*op, graph.get(*operand), graph),
        ElementKind::Expr(ExprKind::Binary { op, lhs, rhs }) => graph.get(*lhs).const_binary(*op, graph.get(*rhs), graph),
        ElementKind::Expr(ExprKind::Cast { value, .. }) => fold_cast(graph.get(*value), graph),
        ElementKind::Expr(ExprKind::IdentRef { .. }) => {
            if el.as_bool(graph).is_some() {
                el.as_bool(graph).map(Literal::Bool)
            } else if el.as_integer(graph).is_some() {
                el.as_integer(graph).map(Literal::Int)
            } else if el.as_float(graph).is_some() {
                el.as_float(graph).map(Literal::Float)
            } else if let Some(s) = el.as_string() {
                Some(Literal::Str(s.to_string()))
            } else {
                el.as_rune().map(Literal::Char)
            }
        }
        ElementKind::Intrinsic(k) => fold_intrinsic(k, graph),
        _ => None,
    }
}

fn fold_unary(op: UnaryOp, operand: &Element, graph: &ElementGraph) -> Option<Literal> {
    match op {
        UnaryOp::Not => operand.as_bool(graph).map(|b| Literal::Bool(!b)),
        UnaryOp::Neg => {
            if let Some(i) = operand.as_integer(graph) {
                Some(Literal::Int(-i))
            } else {
                operand.as_float(graph).map(|f| Literal::Float(-f))
            }
        }
        UnaryOp::BitNot => operand.as_integer(graph).map(|i| Literal::Int(!i)),
        UnaryOp::AddressOf | UnaryOp::Deref => None,
    }
}

fn fold_cast(value: &Element, graph: &ElementGraph) -> Option<Literal> {
    // A cast of an already-constant value narrows/widens within the same literal shape; the
    // target numeric type's exact width is enforced later by the type-check pass (spec's
    // `C052NarrowingOverflow`), not here.
    if let Some(i) = value.as_integer(graph) {
        return Some(Literal::Int(i));
    }
    if let Some(f) = value.as_float(graph) {
        return Some(Literal::Float(f));
    }
    if let Some(b) = value.as_bool(graph) {
        return Some(Literal::Bool(b));
    }
    None
}

fn fold_intrinsic(kind: &crate::element::IntrinsicKind, _graph: &ElementGraph) -> Option<Literal> {
    use crate::element::IntrinsicKind::*;
    match kind {
        // `size_of`/`align_of` fold to a target-dependent constant; this crate models the
        // semantic core, not a concrete ABI, so no layout table exists to fold them against.
        SizeOf { .. } | AlignOf { .. } => None,
        LengthOf { .. } | AddressOf { .. } | TypeOf { .. } | Range { .. } => None,
        Alloc { .. } | Free { .. } | Copy { .. } | Fill { .. } => None,
    }
}

/// Rewrites whichever field of `parent` referenced `old` so it references `new` instead. Covers
/// every element shape that can own a foldable child per `Element::owned_elements`.
fn replace_child(graph: &mut ElementGraph, parent: ElementId, old: ElementId, new: ElementId) {
    let swap = |slot: &mut ElementId| {
        if *slot == old {
            *slot = new;
        }
    };
    let swap_opt = |slot: &mut Option<ElementId>| {
        if *slot == Some(old) {
            *slot = Some(new);
        }
    };
    let swap_vec = |slots: &mut [ElementId]| {
        for s in slots {
            if *s == old {
                *s = new;
            }
        }
    };

    use crate::element::{BindingKind, ControlKind, DirectiveKind, ExprKind, ModuleKind, TypeKind};
    match &mut graph.get_mut(parent).kind {
        ElementKind::Expr(e) => match e {
            ExprKind::Unary { operand, .. } => swap(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                swap(lhs);
                swap(rhs);
            }
            ExprKind::Cast { value, .. } | ExprKind::Transmute { value, .. } => swap(value),
            ExprKind::ArrayCtor { elems, .. } | ExprKind::TupleCtor { elems } => swap_vec(elems),
            ExprKind::TypeCtor { fields, .. } => swap_vec(fields),
            ExprKind::Call { args, .. } => swap(args),
            ExprKind::ArgList { args } => swap_vec(args),
            ExprKind::ArgPair { value, .. } => swap(value),
            ExprKind::Subscript { base, index } => {
                swap(base);
                swap(index);
            }
            ExprKind::Member { base, .. } => swap(base),
            ExprKind::Spread { value } => swap(value),
            ExprKind::IdentRef { .. } => {}
        },
        ElementKind::Binding(b) => match b {
            BindingKind::Decl { declared_type, init, .. } => {
                swap_opt(declared_type);
                swap_opt(init);
            }
            BindingKind::Identifier { declared_type, init, .. } => {
                swap_opt(declared_type);
                swap_opt(init);
            }
            BindingKind::Initializer { value } => swap(value),
            BindingKind::Field { declared_type, default, .. } => {
                swap(declared_type);
                swap_opt(default);
            }
            BindingKind::Assignment { target, value } => {
                swap(target);
                swap(value);
            }
            BindingKind::AssignmentTarget { inner } => swap(inner),
            BindingKind::Symbol(_) | BindingKind::QualifiedSymbol { .. } => {}
        },
        ElementKind::Control(c) => match c {
            ControlKind::Stmt { inner } | ControlKind::Defer { inner } | ControlKind::Label { inner, .. } => swap(inner),
            ControlKind::If { cond, then_branch, else_branch } => {
                swap(cond);
                swap(then_branch);
                swap_opt(else_branch);
            }
            ControlKind::While { cond, body } => {
                swap(cond);
                swap(body);
            }
            ControlKind::ForIn { iterable, body, .. } => {
                swap(iterable);
                swap(body);
            }
            ControlKind::Switch { subject, cases } => {
                swap(subject);
                swap_vec(cases);
            }
            ControlKind::Case { values, body } => {
                swap_vec(values);
                swap(body);
            }
            ControlKind::Return { value } => swap_opt(value),
            ControlKind::With { binding, body } => {
                swap(binding);
                swap(body);
            }
            ControlKind::Block(_) | ControlKind::Fallthrough | ControlKind::Break { .. } | ControlKind::Continue { .. } => {}
        },
        ElementKind::ModuleLevel(m) => {
            if let ModuleKind::ProcedureInstance { ty } = m {
                swap(ty);
            }
        }
        ElementKind::Directive(d) => match d {
            DirectiveKind::Type { ty } | DirectiveKind::CoreType { ty } => swap(ty),
            DirectiveKind::Intrinsic { target, .. } => swap(target),
            DirectiveKind::Run { expr } => swap(expr),
            DirectiveKind::If { branches, else_branch, .. } => {
                for (cond, _) in branches.iter_mut() {
                    swap(cond);
                }
                swap_opt(else_branch);
            }
            DirectiveKind::Assembly { .. } | DirectiveKind::Foreign(_) | DirectiveKind::Language { .. } => {}
        },
        ElementKind::Type(t) => match t {
            TypeKind::Pointer { base } | TypeKind::Spread { base } => swap(base),
            TypeKind::Array { len, elem } => {
                swap_opt(len);
                swap(elem);
            }
            TypeKind::Map { key, value } => {
                swap(key);
                swap(value);
            }
            TypeKind::Tuple { elems } => swap_vec(elems),
            TypeKind::Composite(c) => swap_vec(&mut c.members),
            TypeKind::Procedure(p) => {
                swap_vec(&mut p.params);
                swap_vec(&mut p.returns);
            }
            TypeKind::Family { members } => swap_vec(members),
            TypeKind::Numeric(_)
            | TypeKind::Bool
            | TypeKind::Rune
            | TypeKind::Str
            | TypeKind::Namespace { .. }
            | TypeKind::Module
            | TypeKind::Any
            | TypeKind::TypeInfo
            | TypeKind::Unknown => {}
        },
        ElementKind::Literal(_) | ElementKind::Intrinsic(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_program;
    use crate::parser::Parser;
    use crate::source::SourceBuffer;
    use crate::token::TokenPool;

    fn fold_source(src: &str) -> (ElementGraph, crate::scope::ScopeManager, crate::scope::BlockId) {
        let source = SourceBuffer::new(crate::source::SourceId::new(0), "test.bc".into(), src.to_string());
        let mut pool = TokenPool::new();
        let lexed = crate::lexer::lex(source.id(), source.text(), &mut pool);
        let parsed = Parser::new(&lexed.tokens, &pool).parse().unwrap();
        let lowered = lower_program(&parsed.ast, &pool, &source, parsed.program);
        let mut graph = lowered.graph;
        run(&mut graph);
        (graph, lowered.scopes, lowered.root_scope)
    }

    #[test]
    fn folds_a_constant_arithmetic_chain_through_identifiers() {
        let (graph, scopes, root_scope) = fold_source("a :: 2;\nb :: 3;\nc :: a * b + 1;\n");
        let c_decl = scopes.get(root_scope).identifiers.get("c").copied();
        // `c` is registered under its own name since it is a plain (non-procedure) constant.
        let c_decl = c_decl.expect("c declared");
        let init = match &graph.get(c_decl).kind {
            crate::element::BindingKind::Identifier { init: Some(init), .. } => *init,
            other => panic!("unexpected c shape: {other:?}"),
        };
        assert_eq!(graph.get(init).as_integer(&graph), Some(7));
    }

    #[test]
    fn does_not_fold_a_mutable_runtime_expression() {
        let (graph, scopes, root_scope) = fold_source("y := 10;\nz := y + 1;\n");
        let z = scopes.get(root_scope).identifiers.get("z").copied().expect("z declared");
        let init = match &graph.get(z).kind {
            crate::element::BindingKind::Identifier { init: Some(init), .. } => *init,
            other => panic!("unexpected z shape: {other:?}"),
        };
        assert!(graph.get(init).as_integer(&graph).is_none());
    }
}
