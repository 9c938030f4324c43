//! Pass 4: type inference (spec §4.7 pass 4) — propagates concrete types from literals and
//! declared-type annotations upward through operators, casts, and resolved identifier references,
//! writing the result into `Element::inferred_type`.
//!
//! Literal integers narrow to the smallest type that holds their value (spec §8 scenario 1) via
//! [`crate::element::narrow_to_value`]; every other literal kind maps onto a single fixed builtin.
//! `infer_type` memoizes through `inferred_type` itself, so it is safe to call in any order —
//! element ids are allocated in lowering's bottom-up post-order (a parent's children always get
//! lower ids than the parent), so one ascending sweep already visits every child before its
//! parent, but the recursion makes that an optimization rather than a requirement.

use crate::element::{
    narrow_float_to_value, narrow_to_value, BinaryOp, BindingKind, ElementGraph, ElementId, ElementKind, ExprKind,
    IntrinsicKind, Literal, ModuleKind, NumericType, TypeKind,
};
use crate::scope::{BlockId, ScopeManager};

pub(super) fn run(graph: &mut ElementGraph, scopes: &mut ScopeManager, root_scope: BlockId) {
    for id in graph.ids().collect::<Vec<_>>() {
        infer_type(graph, scopes, root_scope, id);
    }
}

pub(super) fn infer_type(
    graph: &mut ElementGraph,
    scopes: &mut ScopeManager,
    root_scope: BlockId,
    id: ElementId,
) -> Option<ElementId> {
    if let Some(ty) = graph.get(id).inferred_type {
        return Some(ty);
    }
    let ty = compute_type(graph, scopes, root_scope, id)?;
    graph.get_mut(id).inferred_type = Some(ty);
    Some(ty)
}

fn builtin(graph: &ElementGraph, scopes: &ScopeManager, root_scope: BlockId, name: &str) -> Option<ElementId> {
    scopes.find_type(root_scope, name).filter(|&t| matches!(graph.get(t).kind, ElementKind::Type(_)))
}

fn compute_type(graph: &mut ElementGraph, scopes: &mut ScopeManager, root_scope: BlockId, id: ElementId) -> Option<ElementId> {
    let kind = graph.get(id).kind.clone();
    match kind {
        ElementKind::Literal(lit) => literal_type(graph, scopes, root_scope, &lit),
        ElementKind::Expr(ExprKind::IdentRef { resolved: Some(target), .. }) => infer_type(graph, scopes, root_scope, target),
        ElementKind::Expr(ExprKind::IdentRef { resolved: None, .. }) => None,
        ElementKind::Expr(ExprKind::Unary { operand, .. }) => infer_type(graph, scopes, root_scope, operand),
        ElementKind::Expr(ExprKind::Binary { op, lhs, rhs }) => {
            if is_comparison_or_logical(op) {
                builtin(graph, scopes, root_scope, "bool")
            } else {
                let lhs_ty = infer_type(graph, scopes, root_scope, lhs);
                lhs_ty.or_else(|| infer_type(graph, scopes, root_scope, rhs))
            }
        }
        ElementKind::Expr(ExprKind::Cast { ty, .. } | ExprKind::Transmute { ty, .. }) => Some(ty),
        ElementKind::Expr(ExprKind::Subscript { base, .. }) => {
            let base_ty = infer_type(graph, scopes, root_scope, base)?;
            match &graph.get(base_ty).kind {
                ElementKind::Type(TypeKind::Array { elem, .. }) => Some(*elem),
                ElementKind::Type(TypeKind::Map { value, .. }) => Some(*value),
                _ => None,
            }
        }
        ElementKind::Expr(ExprKind::Spread { value }) => infer_type(graph, scopes, root_scope, value),
        ElementKind::Expr(ExprKind::Call { resolved: Some(proc_ty), .. }) => procedure_return(graph, proc_ty),
        ElementKind::Expr(ExprKind::Call { callee, resolved: None, .. }) => {
            // Still unresolved at this point (pass 6 settles overloaded call sites); a callee
            // with exactly one overload candidate is not actually ambiguous, so its return type
            // can be used immediately rather than waiting for overload resolution to run.
            single_overload_return(graph, scopes, callee)
        }
        ElementKind::Intrinsic(k) => intrinsic_type(graph, scopes, root_scope, &k),
        // A declared type wins over whatever the initializer would infer to on its own (spec §8
        // scenario 1: `y : s32 = 42;` is `s32`, not `42`'s own narrowed `u8`).
        ElementKind::Binding(BindingKind::Decl { declared_type: Some(dt), .. })
        | ElementKind::Binding(BindingKind::Identifier { declared_type: Some(dt), .. }) => Some(dt),
        ElementKind::Binding(BindingKind::Decl { init: Some(init), .. })
        | ElementKind::Binding(BindingKind::Identifier { init: Some(init), .. })
        | ElementKind::Binding(BindingKind::Initializer { value: init }) => infer_type(graph, scopes, root_scope, init),
        _ => None,
    }
}

fn procedure_return(graph: &ElementGraph, proc_ty: ElementId) -> Option<ElementId> {
    match &graph.get(proc_ty).kind {
        ElementKind::Type(TypeKind::Procedure(p)) => p.returns.first().copied(),
        _ => None,
    }
}

fn single_overload_return(graph: &ElementGraph, scopes: &ScopeManager, callee: ElementId) -> Option<ElementId> {
    let scope = graph.get(callee).parent_scope?;
    let ElementKind::Expr(ExprKind::IdentRef { symbol, .. }) = &graph.get(callee).kind else {
        return None;
    };
    let candidates = scopes.find_overloads(scope, &symbol.name);
    if candidates.len() != 1 {
        return None;
    }
    let BindingKind::Identifier { init: Some(instance), .. } = &graph.get(candidates[0]).kind else {
        return None;
    };
    let ElementKind::ModuleLevel(ModuleKind::ProcedureInstance { ty }) = &graph.get(*instance).kind else {
        return None;
    };
    procedure_return(graph, *ty)
}

fn is_comparison_or_logical(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq
            | BinaryOp::And
            | BinaryOp::Or
    )
}

fn literal_type(graph: &ElementGraph, scopes: &ScopeManager, root_scope: BlockId, lit: &Literal) -> Option<ElementId> {
    match lit {
        Literal::Bool(_) => builtin(graph, scopes, root_scope, "bool"),
        Literal::Int(v) => builtin(graph, scopes, root_scope, numeric_name(narrow_to_value(*v))),
        Literal::Float(v) => builtin(graph, scopes, root_scope, numeric_name(narrow_float_to_value(*v))),
        Literal::Char(_) => builtin(graph, scopes, root_scope, "rune"),
        Literal::Str(_) => builtin(graph, scopes, root_scope, "str"),
        Literal::Nil | Literal::Uninitialized => builtin(graph, scopes, root_scope, "any"),
    }
}

fn numeric_name(n: NumericType) -> &'static str {
    use NumericType::*;
    match n {
        U8 => "u8",
        U16 => "u16",
        U32 => "u32",
        U64 => "u64",
        S8 => "s8",
        S16 => "s16",
        S32 => "s32",
        S64 => "s64",
        F32 => "f32",
        F64 => "f64",
    }
}

fn intrinsic_type(graph: &ElementGraph, scopes: &ScopeManager, root_scope: BlockId, kind: &IntrinsicKind) -> Option<ElementId> {
    match kind {
        IntrinsicKind::SizeOf { .. } | IntrinsicKind::AlignOf { .. } | IntrinsicKind::LengthOf { .. } => {
            builtin(graph, scopes, root_scope, "u64")
        }
        IntrinsicKind::TypeOf { .. } => builtin(graph, scopes, root_scope, "typeinfo"),
        IntrinsicKind::Alloc { ty, .. } => Some(*ty),
        IntrinsicKind::AddressOf { .. } | IntrinsicKind::Free { .. } | IntrinsicKind::Copy { .. } | IntrinsicKind::Fill { .. } => {
            None
        }
        IntrinsicKind::Range { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_program;
    use crate::parser::Parser;
    use crate::source::SourceBuffer;
    use crate::token::TokenPool;

    fn infer_source(src: &str) -> (ElementGraph, ScopeManager, BlockId, ElementId) {
        let source = SourceBuffer::new(crate::source::SourceId::new(0), "test.bc".into(), src.to_string());
        let mut pool = TokenPool::new();
        let lexed = crate::lexer::lex(source.id(), source.text(), &mut pool);
        let parsed = Parser::new(&lexed.tokens, &pool).parse().unwrap();
        let lowered = lower_program(&parsed.ast, &pool, &source, parsed.program);
        let mut graph = lowered.graph;
        let mut scopes = lowered.scopes;
        let root_scope = lowered.root_scope;
        let last = scopes.get(root_scope).statements.last().copied().unwrap();
        run(&mut graph, &mut scopes, root_scope);
        (graph, scopes, root_scope, last)
    }

    #[test]
    fn narrows_an_untyped_int_literal_to_its_smallest_fit() {
        let (graph, scopes, root_scope, decl) = infer_source("x := 42;\n");
        let ty = graph.get(decl).inferred_type.expect("inferred type");
        let u8 = scopes.find_type(root_scope, "u8").unwrap();
        assert_eq!(ty, u8);
    }

    #[test]
    fn binary_comparison_infers_bool() {
        let (graph, scopes, root_scope, decl) = infer_source("x := 1 < 2;\n");
        let ty = graph.get(decl).inferred_type.expect("inferred type");
        let bool_ty = scopes.find_type(root_scope, "bool").unwrap();
        assert_eq!(ty, bool_ty);
    }
}
