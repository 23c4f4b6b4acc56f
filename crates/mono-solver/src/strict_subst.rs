use crate::boolean_algebra;
use crate::eraser::default_for_kind;
use mono_ast::{EqEnv, Kind, Type, TypeVar, well_known};
use mono_common::{FxHashMap, InternalError, SourceLoc, ice};

/// A type-var→type mapping that defaults any variable outside its domain to
/// the kind-appropriate erasure default, and simplifies Boolean/case-set
/// operator applications once their arguments substitute down to concrete
/// constants (SPEC_FULL.md §4.2). Cloning is cheap enough for the `extend`
/// builder pattern: maps stay small (one entry per in-scope type
/// parameter or region variable).
#[derive(Clone, Debug, Default)]
pub struct StrictSubst {
    map: FxHashMap<TypeVar, Type>,
}

impl StrictSubst {
    #[must_use]
    pub fn empty() -> Self {
        StrictSubst::default()
    }

    #[must_use]
    pub fn from_map(map: FxHashMap<TypeVar, Type>) -> Self {
        StrictSubst { map }
    }

    /// Returns a new substitution with one additional binding. Used by the
    /// specializer's `Scope` rule to temporarily bind a region variable to
    /// `Impure` (SPEC_FULL.md §4.6).
    #[must_use]
    pub fn extend(&self, var: TypeVar, tpe: Type) -> Self {
        let mut map = self.map.clone();
        map.insert(var, tpe);
        StrictSubst { map }
    }

    /// Returns a new substitution with `var` removed from the domain,
    /// companion to `extend` for the `Scope` rule's "unbind, then rebind to
    /// Impure" sequence.
    #[must_use]
    pub fn unbind(&self, var: &TypeVar) -> Self {
        let mut map = self.map.clone();
        map.remove(var);
        StrictSubst { map }
    }

    #[must_use]
    pub fn raw(&self) -> &FxHashMap<TypeVar, Type> {
        &self.map
    }

    /// Merges `other`'s bindings on top of `self`'s, with `other` winning on
    /// key conflicts. Used to compose a `TypeMatch` arm's case-substitution
    /// with the ambient non-strict substitution in scope at the match
    /// (SPEC_FULL.md §4.6 step 4).
    #[must_use]
    pub fn compose_extend(&self, other: &StrictSubst) -> Self {
        let mut map = self.map.clone();
        map.extend(other.map.iter().map(|(k, v)| (k.clone(), v.clone())));
        StrictSubst { map }
    }

    /// Full strict application: substitute, default free variables, and
    /// simplify Boolean/case-set operators (§4.2 steps 1-3).
    pub fn apply(&self, eq_env: &EqEnv, loc: SourceLoc, tpe: &Type) -> Type {
        self.apply_inner(eq_env, loc, tpe, true)
    }

    /// Non-defaulting application: substitutes bound variables but leaves
    /// unbound ones as themselves. Needed only by type-match rigidity
    /// (SPEC_FULL.md §4.6), which must see the scrutinee's *actual* free
    /// variables rather than their erasure defaults.
    pub fn raw_apply(&self, eq_env: &EqEnv, loc: SourceLoc, tpe: &Type) -> Type {
        self.apply_inner(eq_env, loc, tpe, false)
    }

    fn apply_inner(&self, eq_env: &EqEnv, loc: SourceLoc, tpe: &Type, default_free: bool) -> Type {
        match tpe {
            Type::Var(v) => match self.map.get(v) {
                Some(bound) => self.apply_inner(eq_env, loc, bound, default_free),
                None if default_free => default_for_kind(&v.kind),
                None => tpe.clone(),
            },
            Type::Const(c) => {
                if matches!(c.kind, Kind::Effect) && is_named_effect(c.sym.name()) {
                    well_known::universal_effect()
                } else {
                    tpe.clone()
                }
            }
            Type::Apply(f, a) => {
                let f2 = self.apply_inner(eq_env, loc, f, default_free);
                let a2 = self.apply_inner(eq_env, loc, a, default_free);
                simplify_operator(&f2, a2)
            }
            Type::Alias { sym, args, expansion } => Type::Alias {
                sym: sym.clone(),
                args: args.iter().map(|a| self.apply_inner(eq_env, loc, a, default_free)).collect(),
                expansion: Box::new(self.apply_inner(eq_env, loc, expansion, default_free)),
            },
            Type::AssocApply { assoc, arg } => {
                let arg2 = self.apply_inner(eq_env, loc, arg, default_free);
                match eq_env.reduce(assoc, &arg2) {
                    Some(reduced) => self.apply_inner(eq_env, loc, reduced, default_free),
                    None => ice(InternalError::UnreducibleAssocType {
                        assoc: assoc.clone(),
                        arg: format!("{arg2:?}"),
                        loc,
                    }),
                }
            }
        }
    }
}

fn is_named_effect(name: &str) -> bool {
    !matches!(name, "Pure" | "Impure" | "Univ" | "Union" | "Intersection" | "Complement")
}

/// Applies a binary/unary Boolean or case-set operator's smart constructor
/// when `head` is (after substitution) one of those operator constants
/// applied to one argument already; otherwise rebuilds a plain `Apply`.
fn simplify_operator(head: &Type, arg: Type) -> Type {
    let (op_head, prior_args) = head.spine();
    let Type::Const(c) = op_head else {
        return head.clone().apply(arg);
    };
    let name = c.sym.name();
    match (name, prior_args.len()) {
        ("Complement", 0) => boolean_algebra::complement(arg),
        ("Union", 1) => boolean_algebra::union(prior_args[0].clone(), arg),
        ("Intersection", 1) => boolean_algebra::intersection(prior_args[0].clone(), arg),
        ("CaseComplement", 0) => {
            let Kind::CaseSet(enum_sym) = c.kind.clone() else { return head.clone().apply(arg) };
            boolean_algebra::case_complement(enum_sym, arg)
        }
        ("CaseUnion", 1) => {
            let Kind::CaseSet(enum_sym) = c.kind.clone() else { return head.clone().apply(arg) };
            boolean_algebra::case_union(enum_sym, prior_args[0].clone(), arg)
        }
        ("CaseIntersection", 1) => {
            let Kind::CaseSet(enum_sym) = c.kind.clone() else { return head.clone().apply(arg) };
            boolean_algebra::case_intersection(enum_sym, prior_args[0].clone(), arg)
        }
        _ => head.clone().apply(arg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mono_common::Symbol;

    #[test]
    fn unbound_var_defaults_under_apply_but_not_under_raw_apply() {
        let eq_env = EqEnv::new();
        let subst = StrictSubst::empty();
        let v = TypeVar::new(0, Kind::Value);
        let t = Type::Var(v.clone());
        assert_eq!(subst.apply(&eq_env, SourceLoc::dummy(), &t), well_known::unit());
        assert_eq!(subst.raw_apply(&eq_env, SourceLoc::dummy(), &t), t);
    }

    #[test]
    fn extend_then_apply_substitutes_bound_var() {
        let eq_env = EqEnv::new();
        let v = TypeVar::new(0, Kind::Value);
        let int_ty = Type::Const(mono_ast::TypeConstant::new(Symbol::unqualified("Int"), Kind::Value));
        let subst = StrictSubst::empty().extend(v.clone(), int_ty.clone());
        assert_eq!(subst.apply(&eq_env, SourceLoc::dummy(), &Type::Var(v)), int_ty);
    }

    #[test]
    fn unbind_then_extend_round_trips_region_var() {
        let eq_env = EqEnv::new();
        let region = TypeVar::new(7, Kind::Effect);
        let subst = StrictSubst::empty()
            .extend(region.clone(), well_known::pure_effect())
            .unbind(&region)
            .extend(region.clone(), well_known::impure_effect());
        assert_eq!(subst.apply(&eq_env, SourceLoc::dummy(), &Type::Var(region)), well_known::impure_effect());
    }

    #[test]
    fn named_effect_applied_through_subst_becomes_universal() {
        let eq_env = EqEnv::new();
        let subst = StrictSubst::empty();
        let io = Type::Const(mono_ast::TypeConstant::new(Symbol::unqualified("IO"), Kind::Effect));
        assert_eq!(subst.apply(&eq_env, SourceLoc::dummy(), &io), well_known::universal_effect());
    }
}
