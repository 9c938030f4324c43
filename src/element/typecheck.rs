//! Type compatibility (spec §4.6 `on_type_check`): a closed table keyed by the pair of type kinds
//! being compared, plus the numeric-narrowing helpers the inference pass uses for `x := 42;`- and
//! `x := 1.0;`-style declarations (spec §8 scenario 1).

use super::{CompositeType, ElementGraph, ElementId, Literal, NumericType, TypeKind};

/// Controls how strictly [`type_check`] compares two non-float numeric types: `Strict` requires
/// identical width, `Lenient` accepts any `rhs` width at or below `lhs`'s. Neither mode applies
/// once `rhs` is floating-point — that case is gated on `rhs`'s float-ness alone, before `opts`
/// is ever consulted (see `numeric_compatible`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeCheckOptions {
    #[default]
    Lenient,
    Strict,
}

/// Whether a value of type `rhs` may be used where `lhs` is expected, per spec §4.6's closed
/// table. `Any` matches everything; a `Family` matches if any member matches; two composites match
/// iff they carry the same qualified symbol (nominal typing); a pointer matches iff its base
/// recursively matches.
pub fn type_check(graph: &ElementGraph, lhs: ElementId, rhs: ElementId, opts: TypeCheckOptions) -> bool {
    let lhs_ty = graph.get(lhs);
    let rhs_ty = graph.get(rhs);
    let (super::ElementKind::Type(lhs_kind), super::ElementKind::Type(rhs_kind)) = (&lhs_ty.kind, &rhs_ty.kind) else {
        return false;
    };
    if let TypeKind::Any = lhs_kind {
        return true;
    }
    if let TypeKind::Any = rhs_kind {
        return true;
    }
    if let TypeKind::Family { members } = lhs_kind {
        return members.iter().any(|m| type_check(graph, *m, rhs, opts));
    }
    if let TypeKind::Family { members } = rhs_kind {
        return members.iter().any(|m| type_check(graph, lhs, *m, opts));
    }
    type_check_kinds(graph, lhs_kind, rhs_kind, opts)
}

fn type_check_kinds(graph: &ElementGraph, lhs: &TypeKind, rhs: &TypeKind, opts: TypeCheckOptions) -> bool {
    use TypeKind::*;
    match (lhs, rhs) {
        (Numeric(a), Numeric(b)) => numeric_compatible(*a, *b, opts),
        (Bool, Bool) | (Rune, Rune) | (Str, Str) | (Module, Module) | (TypeInfo, TypeInfo) => true,
        (Pointer { base: a }, Pointer { base: b }) => type_check(graph, *a, *b, opts),
        (Spread { base: a }, Spread { base: b }) => type_check(graph, *a, *b, opts),
        (Array { elem: a, .. }, Array { elem: b, .. }) => type_check(graph, *a, *b, opts),
        (Map { key: ka, value: va }, Map { key: kb, value: vb }) => {
            type_check(graph, *ka, *kb, opts) && type_check(graph, *va, *vb, opts)
        }
        (Tuple { elems: a }, Tuple { elems: b }) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| type_check(graph, *x, *y, opts))
        }
        (Composite(a), Composite(b)) => composite_matches(a, b),
        (Namespace { symbol: a }, Namespace { symbol: b }) => a == b,
        (Procedure(a), Procedure(b)) => {
            a.params.len() == b.params.len()
                && a.returns.len() == b.returns.len()
                && a.params.iter().zip(&b.params).all(|(x, y)| type_check(graph, *x, *y, opts))
                && a.returns.iter().zip(&b.returns).all(|(x, y)| type_check(graph, *x, *y, opts))
        }
        (Unknown, _) | (_, Unknown) => false,
        _ => false,
    }
}

fn composite_matches(a: &CompositeType, b: &CompositeType) -> bool {
    a.kind == b.kind && a.symbol == b.symbol
}

/// A floating-point `rhs` is accepted only by a floating-point `lhs`, at any width and
/// regardless of `opts` — the float branch returns before `options.strict` is ever consulted.
/// An integer `rhs` falls through to the ordinary signed/width comparison even when `lhs` is
/// itself floating-point (e.g. `f32` accepts a `u32` source), since only `rhs`'s float-ness
/// gates the special case.
fn numeric_compatible(lhs: NumericType, rhs: NumericType, opts: TypeCheckOptions) -> bool {
    if lhs == rhs {
        return true;
    }
    if rhs.is_float() {
        return lhs.is_float();
    }
    if rhs.is_signed() && !lhs.is_signed() {
        return false;
    }
    match opts {
        TypeCheckOptions::Strict => rhs.width_bits() == lhs.width_bits(),
        TypeCheckOptions::Lenient => rhs.width_bits() <= lhs.width_bits(),
    }
}

/// Infers the narrowest [`NumericType`] that can represent `value` without overflow (spec §8
/// scenario 1: `x := 42;` infers `u8`). Prefers unsigned when `value` is non-negative.
pub fn narrow_to_value(value: i128) -> NumericType {
    NumericType::smallest_unsigned_for(value).unwrap_or_else(|| NumericType::smallest_signed_for(value))
}

/// Infers the narrowest float [`NumericType`] that can represent `value`: `f32` within its
/// range (`±3.4e+38`), `f64` otherwise. Mirrors `narrow_to_value`'s integer narrowing for float
/// literals (spec §4.6's narrowing rule is not integer-only).
pub fn narrow_float_to_value(value: f64) -> NumericType {
    const F32_BOUND: f64 = 3.4e+38;
    if value < -F32_BOUND || value > F32_BOUND {
        NumericType::F64
    } else {
        NumericType::F32
    }
}

/// Whether `lit` can be assigned to `target` without narrowing loss (spec §7 `C052NarrowingOverflow`).
pub fn literal_fits(lit: &Literal, target: NumericType) -> bool {
    match lit {
        Literal::Int(v) => target.fits(*v),
        Literal::Float(_) => target.is_float(),
        _ => false,
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
    fn narrow_to_value_picks_smallest_unsigned() {
        assert_eq!(narrow_to_value(42), NumericType::U8);
        assert_eq!(narrow_to_value(300), NumericType::U16);
        assert_eq!(narrow_to_value(-1), NumericType::S8);
    }

    #[test]
    fn literal_fits_rejects_overflow() {
        assert!(literal_fits(&Literal::Int(255), NumericType::U8));
        assert!(!literal_fits(&Literal::Int(256), NumericType::U8));
    }

    #[test]
    fn numeric_type_check_lenient_allows_widening() {
        let mut b = ElementBuilder::new();
        let u8_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U8)), span());
        let u32_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U32)), span());
        let graph = b.graph();
        assert!(type_check(graph, u32_ty, u8_ty, TypeCheckOptions::Lenient));
        assert!(!type_check(graph, u8_ty, u32_ty, TypeCheckOptions::Lenient));
    }

    #[test]
    fn numeric_type_check_strict_requires_exact_width() {
        let mut b = ElementBuilder::new();
        let u8_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U8)), span());
        let u32_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U32)), span());
        let graph = b.graph();
        assert!(!type_check(graph, u32_ty, u8_ty, TypeCheckOptions::Strict));
    }

    #[test]
    fn narrow_float_to_value_picks_f32_within_range_f64_beyond_it() {
        assert_eq!(narrow_float_to_value(1.0), NumericType::F32);
        assert_eq!(narrow_float_to_value(-3.4e+38), NumericType::F32);
        assert_eq!(narrow_float_to_value(3.5e+38), NumericType::F64);
        assert_eq!(narrow_float_to_value(-3.5e+38), NumericType::F64);
    }

    #[test]
    fn float_rhs_only_matches_a_float_lhs_regardless_of_width_or_strictness() {
        let mut b = ElementBuilder::new();
        let f32_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::F32)), span());
        let f64_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::F64)), span());
        let s32_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::S32)), span());
        let graph = b.graph();
        // Narrower f32 lhs accepts a wider f64 rhs even in strict mode: the float branch never
        // consults `options.strict`.
        assert!(type_check(graph, f32_ty, f64_ty, TypeCheckOptions::Strict));
        // A float rhs is never accepted by a non-float lhs.
        assert!(!type_check(graph, s32_ty, f64_ty, TypeCheckOptions::Lenient));
    }

    #[test]
    fn non_float_rhs_is_accepted_by_a_float_lhs_via_the_ordinary_width_check() {
        let mut b = ElementBuilder::new();
        let f32_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::F32)), span());
        let u32_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U32)), span());
        let graph = b.graph();
        assert!(type_check(graph, f32_ty, u32_ty, TypeCheckOptions::Lenient));
        assert!(type_check(graph, f32_ty, u32_ty, TypeCheckOptions::Strict));
    }

    #[test]
    fn any_matches_everything() {
        let mut b = ElementBuilder::new();
        let any_ty = b.make(ElementKind::Type(TypeKind::Any), span());
        let bool_ty = b.make(ElementKind::Type(TypeKind::Bool), span());
        let graph = b.graph();
        assert!(type_check(graph, any_ty, bool_ty, TypeCheckOptions::Lenient));
        assert!(type_check(graph, bool_ty, any_ty, TypeCheckOptions::Lenient));
    }

    #[test]
    fn pointer_type_check_recurses_on_base() {
        let mut b = ElementBuilder::new();
        let u8_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U8)), span());
        let u32_ty = b.make(ElementKind::Type(TypeKind::Numeric(NumericType::U32)), span());
        let ptr_u8 = b.make(ElementKind::Type(TypeKind::Pointer { base: u8_ty }), span());
        let ptr_u32 = b.make(ElementKind::Type(TypeKind::Pointer { base: u32_ty }), span());
        let graph = b.graph();
        assert!(!type_check(graph, ptr_u8, ptr_u32, TypeCheckOptions::Strict));
        let ptr_u8_again = b.make(ElementKind::Type(TypeKind::Pointer { base: u8_ty }), span());
        assert!(type_check(b.graph(), ptr_u8, ptr_u8_again, TypeCheckOptions::Strict));
    }
}
