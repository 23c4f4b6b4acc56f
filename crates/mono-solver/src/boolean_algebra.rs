use mono_ast::{Kind, Type, TypeConstant, well_known};
use mono_common::Symbol;

/// Canonical smart constructors for the Boolean effect lattice and the
/// per-enum case-set lattice (SPEC_FULL.md §4.2 step 3). Called by the
/// strict substitution once an `Apply` spine's head has been substituted
/// down to a concrete operator constant, so that e.g. `Union(Pure, e)`
/// simplifies to `e` instead of surviving as a literal application.
fn const_name(t: &Type) -> Option<&str> {
    match t {
        Type::Const(c) => Some(c.sym.name()),
        _ => None,
    }
}

#[must_use]
pub fn complement(t: Type) -> Type {
    match const_name(&t) {
        Some("Pure") => well_known::impure_effect(),
        Some("Impure") => well_known::pure_effect(),
        _ => match t {
            // Complement(Complement(x)) = x
            Type::Apply(ref head, ref inner) if is_operator(head, "Complement") => (**inner).clone(),
            other => op1("Complement", other, Kind::Effect),
        },
    }
}

#[must_use]
pub fn union(a: Type, b: Type) -> Type {
    match (const_name(&a), const_name(&b)) {
        (Some("Pure"), _) => b,
        (_, Some("Pure")) => a,
        (Some("Univ"), _) | (_, Some("Univ")) => well_known::universal_effect(),
        _ => op2("Union", a, b, Kind::Effect),
    }
}

#[must_use]
pub fn intersection(a: Type, b: Type) -> Type {
    match (const_name(&a), const_name(&b)) {
        (Some("Univ"), _) => b,
        (_, Some("Univ")) => a,
        (Some("Pure"), _) | (_, Some("Pure")) => well_known::pure_effect(),
        _ => op2("Intersection", a, b, Kind::Effect),
    }
}

#[must_use]
pub fn case_complement(enum_sym: Symbol, t: Type) -> Type {
    match t {
        Type::Apply(ref head, ref inner) if is_operator(head, "CaseComplement") => (**inner).clone(),
        other => op1("CaseComplement", other, Kind::CaseSet(enum_sym)),
    }
}

#[must_use]
pub fn case_union(enum_sym: Symbol, a: Type, b: Type) -> Type {
    if is_empty_case_set(&a) {
        return b;
    }
    if is_empty_case_set(&b) {
        return a;
    }
    op2("CaseUnion", a, b, Kind::CaseSet(enum_sym))
}

#[must_use]
pub fn case_intersection(enum_sym: Symbol, a: Type, b: Type) -> Type {
    if is_empty_case_set(&a) || is_empty_case_set(&b) {
        return well_known::empty_case_set(enum_sym);
    }
    op2("CaseIntersection", a, b, Kind::CaseSet(enum_sym))
}

fn is_empty_case_set(t: &Type) -> bool {
    const_name(t) == Some("EmptyCase")
}

fn is_operator(t: &Type, name: &str) -> bool {
    const_name(t) == Some(name)
}

fn op1(name: &str, arg: Type, kind: Kind) -> Type {
    Type::Const(TypeConstant::new(Symbol::unqualified(name), kind)).apply(arg)
}

fn op2(name: &str, a: Type, b: Type, kind: Kind) -> Type {
    Type::Const(TypeConstant::new(Symbol::unqualified(name), kind)).apply(a).apply(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_with_pure_is_identity() {
        let e = Type::Const(TypeConstant::new(Symbol::unqualified("IO"), Kind::Effect));
        assert_eq!(union(well_known::pure_effect(), e.clone()), e);
    }

    #[test]
    fn union_with_universal_absorbs() {
        let e = Type::Const(TypeConstant::new(Symbol::unqualified("IO"), Kind::Effect));
        assert_eq!(union(well_known::universal_effect(), e), well_known::universal_effect());
    }

    #[test]
    fn double_complement_cancels() {
        let e = Type::Const(TypeConstant::new(Symbol::unqualified("IO"), Kind::Effect));
        assert_eq!(complement(complement(e.clone())), e);
    }

    #[test]
    fn case_union_with_empty_is_identity() {
        let enum_sym = Symbol::unqualified("Color");
        let one = op1("Tag", well_known::unit(), Kind::CaseSet(enum_sym.clone()));
        assert_eq!(case_union(enum_sym.clone(), well_known::empty_case_set(enum_sym), one.clone()), one);
    }
}
