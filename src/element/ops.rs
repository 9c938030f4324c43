//! Capability dispatch over [`ElementKind`] (spec §4.6): `is_constant`, `owned_elements`, the
//! `as_X` family, and compile-time comparison/arithmetic on constants. Each is a plain match over
//! the element's kind — the "dispatch tables (match expressions)" translation spec §9 calls for
//! in place of the source's virtual method table.

use super::{BinaryOp, BindingKind, ControlKind, DirectiveKind, Element, ElementGraph, ElementId, ExprKind, Literal};

impl Element {
    /// Whether this element is a compile-time constant (spec §4.6 `on_is_constant`). Literals are
    /// always constant; an identifier reference is constant iff its target is a `::`-declared
    /// (constant) identifier whose initializer is itself constant; an otherwise-pure expression
    /// is constant iff every operand is.
    pub fn is_constant(&self, graph: &ElementGraph) -> bool {
        match &self.kind {
            super::ElementKind::Literal(_) => true,
            super::ElementKind::Expr(ExprKind::IdentRef { resolved: Some(target), .. }) => {
                is_constant_identifier(graph, *target)
            }
            super::ElementKind::Expr(ExprKind::IdentRef { resolved: None, .. }) => false,
            super::ElementKind::Expr(ExprKind::Unary { operand, .. }) => graph.get(*operand).is_constant(graph),
            super::ElementKind::Expr(ExprKind::Binary { lhs, rhs, .. }) => {
                graph.get(*lhs).is_constant(graph) && graph.get(*rhs).is_constant(graph)
            }
            super::ElementKind::Expr(ExprKind::Cast { value, .. }) => graph.get(*value).is_constant(graph),
            super::ElementKind::Intrinsic(intrinsic) => {
                intrinsic.can_fold() && self.owned_elements().iter().all(|id| graph.get(*id).is_constant(graph))
            }
            _ => false,
        }
    }

    /// Can this element be replaced by a folded literal right now? Per spec §4.6, folding
    /// requires both `is_constant()` and the absence of a `no_fold` attribute.
    pub fn can_fold(&self, graph: &ElementGraph) -> bool {
        !self.no_fold && self.is_constant(graph)
    }

    /// Enumerates the child elements this node owns, for traversal and ownership enumeration
    /// (spec §4.6 `on_owned_elements`) — used by emission (out of scope here) and by
    /// [`Self::is_constant`]'s intrinsic-argument check.
    pub fn owned_elements(&self) -> Vec<ElementId> {
        use super::ElementKind::*;
        match &self.kind {
            Literal(_) => vec![],
            Type(t) => owned_of_type(t),
            Expr(e) => owned_of_expr(e),
            Binding(b) => owned_of_binding(b),
            Control(c) => owned_of_control(c),
            ModuleLevel(m) => owned_of_module(m),
            Directive(d) => owned_of_directive(d),
            Intrinsic(i) => owned_of_intrinsic(i),
        }
    }

    pub fn as_bool(&self, graph: &ElementGraph) -> Option<bool> {
        match &self.kind {
            super::ElementKind::Literal(Literal::Bool(v)) => Some(*v),
            super::ElementKind::Expr(ExprKind::IdentRef { resolved: Some(target), .. }) => {
                follow_constant_init(graph, *target).and_then(|id| graph.get(id).as_bool(graph))
            }
            _ => None,
        }
    }

    pub fn as_integer(&self, graph: &ElementGraph) -> Option<i128> {
        match &self.kind {
            super::ElementKind::Literal(Literal::Int(v)) => Some(*v),
            super::ElementKind::Expr(ExprKind::IdentRef { resolved: Some(target), .. }) => {
                follow_constant_init(graph, *target).and_then(|id| graph.get(id).as_integer(graph))
            }
            _ => None,
        }
    }

    pub fn as_float(&self, graph: &ElementGraph) -> Option<f64> {
        match &self.kind {
            super::ElementKind::Literal(Literal::Float(v)) => Some(*v),
            super::ElementKind::Literal(Literal::Int(v)) => Some(*v as f64),
            super::ElementKind::Expr(ExprKind::IdentRef { resolved: Some(target), .. }) => {
                follow_constant_init(graph, *target).and_then(|id| graph.get(id).as_float(graph))
            }
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            super::ElementKind::Literal(Literal::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_rune(&self) -> Option<char> {
        match &self.kind {
            super::ElementKind::Literal(Literal::Char(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            super::ElementKind::Binding(BindingKind::Identifier { name, .. }) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Structural/value equality between two constant elements (spec §4.6 `on_equals`).
    pub fn const_equals(&self, other: &Element, graph: &ElementGraph) -> Option<bool> {
        if let (Some(a), Some(b)) = (self.as_bool(graph), other.as_bool(graph)) {
            return Some(a == b);
        }
        if let (Some(a), Some(b)) = (self.as_integer(graph), other.as_integer(graph)) {
            return Some(a == b);
        }
        if let (Some(a), Some(b)) = (self.as_float(graph), other.as_float(graph)) {
            return Some(a == b);
        }
        if let (Some(a), Some(b)) = (self.as_string(), other.as_string()) {
            return Some(a == b);
        }
        if let (Some(a), Some(b)) = (self.as_rune(), other.as_rune()) {
            return Some(a == b);
        }
        None
    }

    pub fn const_less_than(&self, other: &Element, graph: &ElementGraph) -> Option<bool> {
        if let (Some(a), Some(b)) = (self.as_integer(graph), other.as_integer(graph)) {
            return Some(a < b);
        }
        if let (Some(a), Some(b)) = (self.as_float(graph), other.as_float(graph)) {
            return Some(a < b);
        }
        None
    }

    /// Constant-folds a binary arithmetic/logical operator over two already-constant operands,
    /// returning the result as a fresh [`Literal`]. `None` if the operator/operand-type
    /// combination is not a compile-time-evaluable one (e.g. division by zero, or a type
    /// mismatch that the type-check pass will separately report).
    pub fn const_binary(&self, op: BinaryOp, other: &Element, graph: &ElementGraph) -> Option<Literal> {
        use BinaryOp::*;
        match op {
            Add | Sub | Mul | Div | Rem | BitAnd | BitOr | BitXor | Shl | Shr => {
                if let (Some(a), Some(b)) = (self.as_integer(graph), other.as_integer(graph)) {
                    return int_arith(op, a, b).map(Literal::Int);
                }
                if matches!(op, Add | Sub | Mul | Div) {
                    if let (Some(a), Some(b)) = (self.as_float(graph), other.as_float(graph)) {
                        return float_arith(op, a, b).map(Literal::Float);
                    }
                }
                None
            }
            Eq => self.const_equals(other, graph).map(Literal::Bool),
            NotEq => self.const_equals(other, graph).map(|v| Literal::Bool(!v)),
            Lt => self.const_less_than(other, graph).map(Literal::Bool),
            GtEq => self.const_less_than(other, graph).map(|v| Literal::Bool(!v)),
            Gt => other.const_less_than(self, graph).map(Literal::Bool),
            LtEq => other.const_less_than(self, graph).map(|v| Literal::Bool(!v)),
            And => {
                if let (Some(a), Some(b)) = (self.as_bool(graph), other.as_bool(graph)) {
                    return Some(Literal::Bool(a && b));
                }
                None
            }
            Or => {
                if let (Some(a), Some(b)) = (self.as_bool(graph), other.as_bool(graph)) {
                    return Some(Literal::Bool(a || b));
                }
                None
            }
        }
    }
}

fn int_arith(op: BinaryOp, a: i128, b: i128) -> Option<i128> {
    use BinaryOp::*;
    match op {
        Add => a.checked_add(b),
        Sub => a.checked_sub(b),
        Mul => a.checked_mul(b),
        Div => (b != 0).then(|| a / b),
        Rem => (b != 0).then(|| a % b),
        BitAnd => Some(a & b),
        BitOr => Some(a | b),
        BitXor => Some(a ^ b),
        Shl => u32::try_from(b).ok().map(|s| a << s),
        Shr => u32::try_from(b).ok().map(|s| a >> s),
        _ => None,
    }
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> Option<f64> {
    use BinaryOp::*;
    match op {
        Add => Some(a + b),
        Sub => Some(a - b),
        Mul => Some(a * b),
        Div => Some(a / b),
        _ => None,
    }
}

fn is_constant_identifier(graph: &ElementGraph, id: ElementId) -> bool {
    match &graph.get(id).kind {
        super::ElementKind::Binding(BindingKind::Identifier { constant: true, init: Some(init), .. }) => {
            graph.get(*init).is_constant(graph)
        }
        _ => false,
    }
}

fn follow_constant_init(graph: &ElementGraph, id: ElementId) -> Option<ElementId> {
    match &graph.get(id).kind {
        super::ElementKind::Binding(BindingKind::Identifier { constant: true, init: Some(init), .. }) => Some(*init),
        _ => None,
    }
}

fn owned_of_type(t: &super::TypeKind) -> Vec<ElementId> {
    use super::TypeKind::*;
    match t {
        Numeric(_) | Bool | Rune | Str | Module | Any | TypeInfo | Unknown | Namespace { .. } => vec![],
        Pointer { base } | Spread { base } => vec![*base],
        Array { len, elem } => len.into_iter().chain(std::iter::once(elem)).copied().collect(),
        Map { key, value } => vec![*key, *value],
        Tuple { elems } => elems.clone(),
        Composite(c) => c.members.clone(),
        Procedure(p) => {
            let mut out = p.params.clone();
            out.extend(p.returns.iter().copied());
            out
        }
        Family { members } => members.clone(),
    }
}

fn owned_of_expr(e: &ExprKind) -> Vec<ElementId> {
    use ExprKind::*;
    match e {
        Unary { operand, .. } => vec![*operand],
        Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
        Cast { ty, value } | Transmute { ty, value } => vec![*ty, *value],
        ArrayCtor { ty, elems } => ty.into_iter().copied().chain(elems.iter().copied()).collect(),
        TupleCtor { elems } => elems.clone(),
        TypeCtor { ty, fields } => std::iter::once(*ty).chain(fields.iter().copied()).collect(),
        Call { callee, args, .. } => vec![*callee, *args],
        ArgList { args } => args.clone(),
        ArgPair { value, .. } => vec![*value],
        IdentRef { .. } => vec![],
        Subscript { base, index } => vec![*base, *index],
        Member { base, .. } => vec![*base],
        Spread { value } => vec![*value],
    }
}

fn owned_of_binding(b: &BindingKind) -> Vec<ElementId> {
    use BindingKind::*;
    match b {
        Symbol(_) | QualifiedSymbol { .. } => vec![],
        Decl { identifier, declared_type, init, .. } => {
            let mut out = vec![*identifier];
            out.extend(declared_type.iter().copied());
            out.extend(init.iter().copied());
            out
        }
        Identifier { declared_type, init, .. } => {
            declared_type.iter().copied().chain(init.iter().copied()).collect()
        }
        Initializer { value } => vec![*value],
        Field { declared_type, default, .. } => std::iter::once(*declared_type).chain(default.iter().copied()).collect(),
        Assignment { target, value } => vec![*target, *value],
        AssignmentTarget { inner } => vec![*inner],
    }
}

fn owned_of_control(c: &ControlKind) -> Vec<ElementId> {
    use ControlKind::*;
    match c {
        Block(_) | Fallthrough | Break { .. } | Continue { .. } => vec![],
        Stmt { inner } | Defer { inner } | Label { inner, .. } => vec![*inner],
        If { cond, then_branch, else_branch } => {
            std::iter::once(*cond).chain(std::iter::once(*then_branch)).chain(else_branch.iter().copied()).collect()
        }
        While { cond, body } => vec![*cond, *body],
        ForIn { iterable, body, .. } => vec![*iterable, *body],
        Switch { subject, cases } => std::iter::once(*subject).chain(cases.iter().copied()).collect(),
        Case { values, body } => values.iter().copied().chain(std::iter::once(*body)).collect(),
        Return { value } => value.iter().copied().collect(),
        With { binding, body } => vec![*binding, *body],
    }
}

fn owned_of_module(m: &super::ModuleKind) -> Vec<ElementId> {
    use super::ModuleKind::*;
    match m {
        Module { .. } | Namespace { .. } | Import { .. } => vec![],
        Program { .. } => vec![],
        ProcedureInstance { ty } => vec![*ty],
    }
}

fn owned_of_directive(d: &DirectiveKind) -> Vec<ElementId> {
    use DirectiveKind::*;
    match d {
        Assembly { .. } | Foreign(_) | Language { .. } => vec![],
        Intrinsic { target, .. } => vec![*target],
        Type { ty } | CoreType { ty } => vec![*ty],
        Run { expr } => vec![*expr],
        If { branches, else_branch, .. } => {
            branches.iter().flat_map(|(c, b)| [*c, *b]).chain(else_branch.iter().copied()).collect()
        }
    }
}

fn owned_of_intrinsic(i: &super::IntrinsicKind) -> Vec<ElementId> {
    use super::IntrinsicKind::*;
    match i {
        SizeOf { ty } | AlignOf { ty } => vec![*ty],
        AddressOf { value } | TypeOf { value } | Free { value } => vec![*value],
        LengthOf { value } => vec![*value],
        Alloc { ty, count } => std::iter::once(*ty).chain(count.iter().copied()).collect(),
        Copy { dest, src, count } => vec![*dest, *src, *count],
        Fill { dest, value, count } => vec![*dest, *value, *count],
        Range { start, end } => vec![*start, *end],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementBuilder, ElementKind};
    use crate::source::{SourceId, Span};

    fn span() -> Span {
        Span::new(SourceId::new(0), 0, 1)
    }

    #[test]
    fn literal_is_constant_and_folds() {
        let mut b = ElementBuilder::new();
        let id = b.make_int_lit(7, span());
        let graph = b.graph();
        assert!(graph.get(id).is_constant(graph));
        assert!(graph.get(id).can_fold(graph));
        assert_eq!(graph.get(id).as_integer(graph), Some(7));
    }

    #[test]
    fn no_fold_attribute_blocks_folding_but_not_constness() {
        let mut b = ElementBuilder::new();
        let id = b.make_no_fold(ElementKind::Literal(super::Literal::Int(7)), span());
        let graph = b.graph();
        assert!(graph.get(id).is_constant(graph));
        assert!(!graph.get(id).can_fold(graph));
    }

    #[test]
    fn const_binary_add_folds_integers() {
        let mut b = ElementBuilder::new();
        let a = b.make_int_lit(2, span());
        let c = b.make_int_lit(3, span());
        let graph = b.graph();
        let result = graph.get(a).const_binary(BinaryOp::Add, graph.get(c), graph);
        assert!(matches!(result, Some(Literal::Int(5))));
    }

    #[test]
    fn const_binary_division_by_zero_does_not_fold() {
        let mut b = ElementBuilder::new();
        let a = b.make_int_lit(1, span());
        let zero = b.make_int_lit(0, span());
        let graph = b.graph();
        assert!(graph.get(a).const_binary(BinaryOp::Div, graph.get(zero), graph).is_none());
    }

    #[test]
    fn owned_elements_for_binary_returns_both_operands() {
        let mut b = ElementBuilder::new();
        let lhs = b.make_int_lit(1, span());
        let rhs = b.make_int_lit(2, span());
        let bin = b.make(ElementKind::Expr(ExprKind::Binary { op: BinaryOp::Add, lhs, rhs }), span());
        assert_eq!(b.graph().get(bin).owned_elements(), vec![lhs, rhs]);
    }
}
