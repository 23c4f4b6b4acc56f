use crate::strict_subst::StrictSubst;
use ena::unify::{InPlaceUnificationTable, UnifyKey, UnifyValue};
use mono_ast::{EqConstraint, EqEnv, Type, TypeVar};
use mono_common::{FxHashMap, FxHashSet, InternalError, SourceLoc, ice};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct TyVarKey(u32);

impl UnifyKey for TyVarKey {
    type Value = TySlot;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVarKey(u)
    }

    fn tag() -> &'static str {
        "TyVarKey"
    }
}

#[derive(Clone, Debug)]
struct TySlot(Option<Type>);

#[derive(Clone, Debug)]
struct Conflict;

impl UnifyValue for TySlot {
    type Error = Conflict;

    fn unify_values(a: &TySlot, b: &TySlot) -> Result<TySlot, Conflict> {
        match (&a.0, &b.0) {
            (None, None) => Ok(TySlot(None)),
            (Some(t), None) | (None, Some(t)) => Ok(TySlot(Some(t.clone()))),
            (Some(x), Some(y)) if x == y => Ok(TySlot(Some(x.clone()))),
            _ => Err(Conflict),
        }
    }
}

/// The result of unifying a declared scheme base with a concrete demand
/// type: the resulting strict substitution, plus any equality constraints
/// that could not be reduced eagerly. The pass records `pending_eq` but
/// deliberately does not act on it today (SPEC_FULL.md §9, Open Question).
pub struct UnifyOutcome {
    pub subst: StrictSubst,
    pub pending_eq: Vec<EqConstraint>,
}

struct Unifier<'a> {
    table: InPlaceUnificationTable<TyVarKey>,
    var_map: FxHashMap<TypeVar, TyVarKey>,
    eq_env: &'a EqEnv,
    pending_eq: Vec<EqConstraint>,
    /// Variables that may only unify with themselves (SPEC_FULL.md §4.6
    /// type-match rigidity). Empty for ordinary unification.
    rigid: FxHashSet<TypeVar>,
}

impl<'a> Unifier<'a> {
    fn new(eq_env: &'a EqEnv) -> Self {
        Unifier { table: InPlaceUnificationTable::new(), var_map: FxHashMap::default(), eq_env, pending_eq: Vec::new(), rigid: FxHashSet::default() }
    }

    fn with_rigid(eq_env: &'a EqEnv, rigid: FxHashSet<TypeVar>) -> Self {
        Unifier { table: InPlaceUnificationTable::new(), var_map: FxHashMap::default(), eq_env, pending_eq: Vec::new(), rigid }
    }

    fn key_for(&mut self, v: &TypeVar) -> TyVarKey {
        if let Some(&k) = self.var_map.get(v) {
            return k;
        }
        let k = self.table.new_key(TySlot(None));
        self.var_map.insert(v.clone(), k);
        k
    }

    fn unify_types(&mut self, a: &Type, b: &Type) -> Result<(), ()> {
        match (a, b) {
            (Type::Var(v), _) => self.bind(v, b),
            (_, Type::Var(v)) => self.bind(v, a),
            (Type::Const(c1), Type::Const(c2)) => {
                if c1.sym == c2.sym {
                    Ok(())
                } else {
                    Err(())
                }
            }
            (Type::Apply(f1, a1), Type::Apply(f2, a2)) => {
                self.unify_types(f1, f2)?;
                self.unify_types(a1, a2)
            }
            (Type::Alias { expansion, .. }, other) | (other, Type::Alias { expansion, .. }) => {
                self.unify_types(expansion, other)
            }
            (Type::AssocApply { assoc, arg }, other) | (other, Type::AssocApply { assoc, arg }) => {
                match self.eq_env.reduce(assoc, arg) {
                    Some(reduced) => self.unify_types(&reduced.clone(), other),
                    None => {
                        self.pending_eq.push(EqConstraint { assoc: assoc.clone(), arg: (**arg).clone(), result: other.clone() });
                        Ok(())
                    }
                }
            }
            _ => Err(()),
        }
    }

    fn bind(&mut self, v: &TypeVar, t: &Type) -> Result<(), ()> {
        if self.rigid.contains(v) {
            return match t {
                Type::Var(v2) if v2 == v => Ok(()),
                _ => Err(()),
            };
        }
        let key = self.key_for(v);
        let existing = self.table.probe_value(key).0;
        match existing {
            None => self.table.unify_var_value(key, TySlot(Some(t.clone()))).map_err(|_| ()),
            Some(existing_t) => self.unify_types(&existing_t, t),
        }
    }

    fn finish(mut self) -> FxHashMap<TypeVar, Type> {
        let vars: Vec<TypeVar> = self.var_map.keys().cloned().collect();
        let mut result = FxHashMap::default();
        for var in vars {
            let key = self.var_map[&var];
            let mut seen = FxHashSet::default();
            if let Some(t) = self.resolve(key, &mut seen) {
                result.insert(var, t);
            }
        }
        result
    }

    fn resolve(&mut self, key: TyVarKey, seen: &mut FxHashSet<u32>) -> Option<Type> {
        if !seen.insert(key.index()) {
            return None;
        }
        let slot = self.table.probe_value(key).0?;
        Some(self.resolve_type(&slot, seen))
    }

    fn resolve_type(&mut self, t: &Type, seen: &mut FxHashSet<u32>) -> Type {
        match t {
            Type::Var(v) => match self.var_map.get(v).copied() {
                Some(k) => self.resolve(k, seen).unwrap_or_else(|| t.clone()),
                None => t.clone(),
            },
            Type::Apply(f, a) => Type::Apply(Box::new(self.resolve_type(f, seen)), Box::new(self.resolve_type(a, seen))),
            Type::Alias { sym, args, expansion } => Type::Alias {
                sym: sym.clone(),
                args: args.iter().map(|a| self.resolve_type(a, seen)).collect(),
                expansion: Box::new(self.resolve_type(expansion, seen)),
            },
            Type::AssocApply { assoc, arg } => Type::AssocApply { assoc: assoc.clone(), arg: Box::new(self.resolve_type(arg, seen)) },
            Type::Const(_) => t.clone(),
        }
    }
}

/// Attempts to unify `declared` with `demanded`, returning `None` on
/// failure instead of raising. Used by the trait resolver (`mono-resolve`)
/// to test candidate instance members without panicking on a non-match.
pub fn try_unify(eq_env: &EqEnv, declared: &Type, demanded: &Type) -> Option<UnifyOutcome> {
    let mut unifier = Unifier::new(eq_env);
    if unifier.unify_types(declared, demanded).is_err() {
        return None;
    }
    let pending_eq = std::mem::take(&mut unifier.pending_eq);
    let map = unifier.finish();
    Some(UnifyOutcome { subst: StrictSubst::from_map(map), pending_eq })
}

/// Like `try_unify`, but variables in `rigid` may only unify with
/// themselves. Used by the type-match rewrite to test a scrutinee's actual
/// (non-defaulted) free variables against each rule's declared type without
/// letting the match spuriously "succeed" by binding them away
/// (SPEC_FULL.md §4.6).
pub fn try_unify_rigid(eq_env: &EqEnv, rigid: &FxHashSet<TypeVar>, a: &Type, b: &Type) -> Option<UnifyOutcome> {
    let mut unifier = Unifier::with_rigid(eq_env, rigid.clone());
    if unifier.unify_types(a, b).is_err() {
        return None;
    }
    let pending_eq = std::mem::take(&mut unifier.pending_eq);
    let map = unifier.finish();
    Some(UnifyOutcome { subst: StrictSubst::from_map(map), pending_eq })
}

/// Unifies `declared` (a scheme base, possibly containing type variables)
/// with `demanded` (a concrete instantiation type) and produces a strict
/// substitution. Failure is an internal-compiler-error: unifiability here
/// is a post-type-check invariant (SPEC_FULL.md §4.3).
pub fn unify(eq_env: &EqEnv, loc: SourceLoc, declared: &Type, demanded: &Type) -> UnifyOutcome {
    match try_unify(eq_env, declared, demanded) {
        Some(outcome) => {
            tracing::trace!(pending_eq = outcome.pending_eq.len(), "unified scheme base against demand");
            outcome
        }
        None => ice(InternalError::UnificationFailure { loc, lhs: format!("{declared:?}"), rhs: format!("{demanded:?}") }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mono_ast::{Kind, TypeConstant, well_known};
    use mono_common::Symbol;

    fn int_ty() -> Type {
        Type::Const(TypeConstant::new(Symbol::unqualified("Int"), Kind::Value))
    }

    #[test]
    fn unifies_var_with_concrete_type() {
        let eq_env = EqEnv::new();
        let v = TypeVar::new(0, Kind::Value);
        let outcome = unify(&eq_env, SourceLoc::dummy(), &Type::Var(v.clone()), &int_ty());
        assert_eq!(outcome.subst.apply(&eq_env, SourceLoc::dummy(), &Type::Var(v)), int_ty());
    }

    #[test]
    fn unifies_nested_application_componentwise() {
        let eq_env = EqEnv::new();
        let a = TypeVar::new(0, Kind::Value);
        let b = TypeVar::new(1, Kind::Value);
        let list = Type::Const(TypeConstant::new(Symbol::unqualified("Pair"), Kind::Value));
        let declared = list.clone().apply(Type::Var(a.clone())).apply(Type::Var(b.clone()));
        let demanded = list.apply(int_ty()).apply(well_known::unit());
        let outcome = unify(&eq_env, SourceLoc::dummy(), &declared, &demanded);
        assert_eq!(outcome.subst.apply(&eq_env, SourceLoc::dummy(), &Type::Var(a)), int_ty());
        assert_eq!(outcome.subst.apply(&eq_env, SourceLoc::dummy(), &Type::Var(b)), well_known::unit());
    }

    #[test]
    #[should_panic]
    fn mismatched_constants_panics() {
        let eq_env = EqEnv::new();
        let bool_ty = Type::Const(TypeConstant::new(Symbol::unqualified("Bool"), Kind::Value));
        unify(&eq_env, SourceLoc::dummy(), &int_ty(), &bool_ty);
    }

    #[test]
    fn rigid_var_unifies_with_itself_but_not_a_concrete_type() {
        let eq_env = EqEnv::new();
        let v = TypeVar::new(0, Kind::Value);
        let mut rigid = FxHashSet::default();
        rigid.insert(v.clone());

        assert!(try_unify_rigid(&eq_env, &rigid, &Type::Var(v.clone()), &Type::Var(v.clone())).is_some());
        assert!(try_unify_rigid(&eq_env, &rigid, &Type::Var(v), &int_ty()).is_none());
    }
}
