//! Pass 6: overload resolution (spec §4.7 pass 6) — for every call site, matches its arguments
//! against each candidate's parameter list, selects the single candidate whose arguments all
//! type-check, and writes the winner back into `ExprKind::Call::resolved`.
//!
//! Every procedure constant is registered as an overload candidate (`ScopeManager::register_overload`,
//! never `declare_identifier` — see `resolve.rs`'s doc comment), so a call's callee is matched by
//! name against `ScopeManager::find_overloads` regardless of whether one or several candidates
//! share that name; a lone candidate is just the degenerate one-element case of the same search.
//!
//! Matching a single candidate's parameter list against a call's argument list is
//! [`prepare_call_site`]: positional arguments fill left to right, named arguments (`ArgPair`)
//! are slotted by parameter name wherever they land, unfilled slots fall back to the parameter's
//! own default initializer, and every filled slot is then type-checked against its parameter's
//! declared type. This mirrors the teacher's "two-pass, re-run on mutation" shape for argument
//! matching (`plotnik-lib/src/analyze/binder.rs`'s named-capture binding) rather than a single
//! strict left-to-right zip, since named arguments can arrive out of parameter order.

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::element::{
    literal_fits, type_check, BindingKind, ElementGraph, ElementId, ElementKind, ExprKind, Literal, ModuleKind,
    TypeCheckOptions, TypeKind,
};
use crate::scope::ScopeManager;

pub(super) fn run(graph: &mut ElementGraph, scopes: &ScopeManager, diagnostics: &mut Diagnostics) {
    for id in graph.ids().collect::<Vec<_>>() {
        let (callee, args_id, span) = {
            let ElementKind::Expr(ExprKind::Call { callee, args, resolved: None, .. }) = &graph.get(id).kind else {
                continue;
            };
            (*callee, *args, graph.get(id).span)
        };
        let Some(scope) = graph.get(callee).parent_scope else { continue };
        let ElementKind::Expr(ExprKind::IdentRef { symbol, .. }) = &graph.get(callee).kind else { continue };
        let name = symbol.name.clone();
        let candidates = scopes.find_overloads(scope, &name);
        if candidates.is_empty() {
            continue;
        }
        let args = match &graph.get(args_id).kind {
            ElementKind::Expr(ExprKind::ArgList { args }) => args.clone(),
            _ => continue,
        };

        let mut successes = Vec::new();
        let mut all_messages = Vec::new();
        for &candidate in &candidates {
            let Some(params) = params_of(graph, candidate) else { continue };
            match prepare_call_site(graph, &params, &args) {
                Ok(ordered) => successes.push((candidate, ordered)),
                Err(messages) => all_messages.extend(messages),
            }
        }

        match successes.len() {
            0 => {
                let mut builder = diagnostics.report(DiagnosticCode::B020NoMatchingOverload, span);
                if let Some(msg) = all_messages.first() {
                    builder = builder.message(format!("no overload of `{name}` matches this call: {msg}"));
                }
                builder.emit();
            }
            1 => {
                let (winner, ordered) = successes.into_iter().next().unwrap();
                let proc_ty = procedure_type_of_candidate(graph, winner).unwrap_or(winner);
                if let ElementKind::Expr(ExprKind::ArgList { args }) = &mut graph.get_mut(args_id).kind {
                    *args = ordered;
                }
                if let ElementKind::Expr(ExprKind::Call { resolved, .. }) = &mut graph.get_mut(id).kind {
                    *resolved = Some(proc_ty);
                }
            }
            _ => {
                diagnostics
                    .report(DiagnosticCode::B021AmbiguousCallSite, span)
                    .message(format!("call to `{name}` matches {} overloads", successes.len()))
                    .emit();
            }
        }
    }
}

fn procedure_type_of_candidate(graph: &ElementGraph, identifier: ElementId) -> Option<ElementId> {
    let BindingKind::Identifier { init: Some(init), .. } = &graph.get(identifier).kind else { return None };
    match &graph.get(*init).kind {
        ElementKind::ModuleLevel(ModuleKind::ProcedureInstance { ty }) => Some(*ty),
        ElementKind::Type(TypeKind::Procedure(_)) => Some(*init),
        _ => None,
    }
}

fn params_of(graph: &ElementGraph, identifier: ElementId) -> Option<Vec<ElementId>> {
    let proc_ty = procedure_type_of_candidate(graph, identifier)?;
    match &graph.get(proc_ty).kind {
        ElementKind::Type(TypeKind::Procedure(p)) => Some(p.params.clone()),
        _ => None,
    }
}

fn field_name(graph: &ElementGraph, field: ElementId) -> Option<String> {
    match &graph.get(field).kind {
        ElementKind::Binding(BindingKind::Field { name, .. }) => Some(name.clone()),
        _ => None,
    }
}

fn field_type(graph: &ElementGraph, field: ElementId) -> Option<ElementId> {
    match &graph.get(field).kind {
        ElementKind::Binding(BindingKind::Field { declared_type, .. }) => Some(*declared_type),
        _ => None,
    }
}

fn field_default(graph: &ElementGraph, field: ElementId) -> Option<ElementId> {
    match &graph.get(field).kind {
        ElementKind::Binding(BindingKind::Field { default, .. }) => *default,
        _ => None,
    }
}

/// Matches `args` against `params`, returning the final argument order on success or the set of
/// reasons matching failed. A slot left unfilled after both positional and named matching falls
/// back to its parameter's default; one still unfilled after that is a missing argument.
pub(super) fn prepare_call_site(graph: &ElementGraph, params: &[ElementId], args: &[ElementId]) -> Result<Vec<ElementId>, Vec<String>> {
    let mut slots: Vec<Option<ElementId>> = vec![None; params.len()];
    let mut errors = Vec::new();
    let mut positional = 0usize;

    for &arg in args {
        if let ElementKind::Expr(ExprKind::ArgPair { name, value }) = &graph.get(arg).kind {
            match params.iter().position(|&p| field_name(graph, p).as_deref() == Some(name.as_str())) {
                Some(pos) => slots[pos] = Some(*value),
                None => errors.push(format!("no parameter named `{name}`")),
            }
        } else if positional < params.len() {
            slots[positional] = Some(arg);
            positional += 1;
        } else {
            errors.push("too many positional arguments".to_string());
        }
    }

    for (i, slot) in slots.iter_mut().enumerate() {
        if slot.is_none() {
            *slot = field_default(graph, params[i]);
        }
    }
    if let Some(i) = slots.iter().position(Option::is_none) {
        let name = field_name(graph, params[i]).unwrap_or_default();
        errors.push(format!("missing argument `{name}`"));
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut ordered = Vec::with_capacity(params.len());
    for (i, slot) in slots.into_iter().enumerate() {
        let arg = slot.unwrap();
        let Some(param_ty) = field_type(graph, params[i]) else {
            ordered.push(arg);
            continue;
        };
        // A bare integer literal is matched against the candidate's declared parameter type by
        // value (spec §8 scenario 3: `foo(1)` picks the `s32` overload), not by its own
        // already-inferred narrowest type (unsigned `u8` for a non-negative literal), which would
        // reject a signed parameter outright on signedness alone. Mirrors `check.rs`'s assignment
        // check for the same reason.
        let matches = match &graph.get(arg).kind {
            ElementKind::Literal(lit @ Literal::Int(_)) => match &graph.get(param_ty).kind {
                ElementKind::Type(TypeKind::Numeric(target)) => literal_fits(lit, *target),
                _ => false,
            },
            _ => graph
                .get(arg)
                .inferred_type
                .is_some_and(|arg_ty| type_check(graph, param_ty, arg_ty, TypeCheckOptions::Lenient)),
        };
        if !matches {
            errors.push(format!("argument {} does not match parameter type", i + 1));
        }
        ordered.push(arg);
    }
    if errors.is_empty() {
        Ok(ordered)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_positional_args_then_defaults() {
        let mut builder = crate::element::ElementBuilder::new();
        let span = crate::source::Span::new(crate::source::SourceId::new(0), 0, 1);
        let s32 = builder.make(ElementKind::Type(TypeKind::Numeric(crate::element::NumericType::S32)), span);
        let default_value = builder.make_int_lit(9, span);
        let p0 = builder.make(
            ElementKind::Binding(BindingKind::Field { name: "a".into(), declared_type: s32, default: None }),
            span,
        );
        let p1 = builder.make(
            ElementKind::Binding(BindingKind::Field { name: "b".into(), declared_type: s32, default: Some(default_value) }),
            span,
        );
        let arg0 = builder.make_int_lit(1, span);
        builder.graph_mut().get_mut(arg0).inferred_type = Some(s32);
        let ordered = prepare_call_site(builder.graph(), &[p0, p1], &[arg0]).expect("matches");
        assert_eq!(ordered, vec![arg0, default_value]);
    }

    #[test]
    fn missing_required_argument_is_reported() {
        let mut builder = crate::element::ElementBuilder::new();
        let span = crate::source::Span::new(crate::source::SourceId::new(0), 0, 1);
        let s32 = builder.make(ElementKind::Type(TypeKind::Numeric(crate::element::NumericType::S32)), span);
        let p0 = builder.make(
            ElementKind::Binding(BindingKind::Field { name: "a".into(), declared_type: s32, default: None }),
            span,
        );
        let err = prepare_call_site(builder.graph(), &[p0], &[]).unwrap_err();
        assert!(err.iter().any(|m| m.contains("missing")));
    }
}
