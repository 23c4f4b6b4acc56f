use mono_ast::{Kind, Type, TypeConstant, well_known};
use mono_common::{InternalError, SourceLoc, ice};

/// Type erasure (SPEC_FULL.md §4.1). Produces a canonical concrete type used
/// as a registry memo key and as a unification target; never called on a
/// type that still has unresolved type parameters demanding a particular
/// instantiation, only on one already run through a strict substitution.
pub fn erase(eq_env: &mono_ast::EqEnv, loc: SourceLoc, tpe: &Type) -> Type {
    match tpe {
        Type::Var(v) => default_for_kind(&v.kind),
        Type::Const(c) => erase_const(c),
        Type::Apply(f, a) => Type::Apply(Box::new(erase(eq_env, loc, f)), Box::new(erase(eq_env, loc, a))),
        Type::Alias { sym, args, expansion } => Type::Alias {
            sym: sym.clone(),
            args: args.iter().map(|a| erase(eq_env, loc, a)).collect(),
            expansion: Box::new(erase(eq_env, loc, expansion)),
        },
        Type::AssocApply { assoc, arg } => {
            let erased_arg = erase(eq_env, loc, arg);
            match eq_env.reduce(assoc, &erased_arg) {
                Some(reduced) => erase(eq_env, loc, reduced),
                None => ice(InternalError::UnreducibleAssocType {
                    assoc: assoc.clone(),
                    arg: format!("{erased_arg:?}"),
                    loc,
                }),
            }
        }
    }
}

#[must_use]
pub fn default_for_kind(kind: &Kind) -> Type {
    match kind {
        Kind::Value => well_known::unit(),
        Kind::Effect => well_known::pure_effect(),
        Kind::RecordRow => well_known::empty_record_row(),
        Kind::SchemaRow => well_known::empty_schema_row(),
        Kind::CaseSet(enum_sym) => well_known::empty_case_set(enum_sym.clone()),
    }
}

/// A named concrete effect constant (anything of effect kind that is not
/// `Pure`/`Impure`/`Univ` themselves) erases to the universal effect; those
/// three pass through unchanged.
fn erase_const(c: &TypeConstant) -> Type {
    if matches!(c.kind, Kind::Effect) && !is_builtin_effect_name(c.sym.name()) {
        well_known::universal_effect()
    } else {
        Type::Const(c.clone())
    }
}

fn is_builtin_effect_name(name: &str) -> bool {
    matches!(name, "Pure" | "Impure" | "Univ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mono_ast::TypeVar;
    use mono_common::Symbol;

    #[test]
    fn unbound_value_var_erases_to_unit() {
        let eq_env = mono_ast::EqEnv::new();
        let v = Type::Var(TypeVar::new(0, Kind::Value));
        assert_eq!(erase(&eq_env, SourceLoc::dummy(), &v), well_known::unit());
    }

    #[test]
    fn named_effect_constant_erases_to_universal() {
        let eq_env = mono_ast::EqEnv::new();
        let io = Type::Const(TypeConstant::new(Symbol::unqualified("IO"), Kind::Effect));
        assert_eq!(erase(&eq_env, SourceLoc::dummy(), &io), well_known::universal_effect());
    }

    #[test]
    fn pure_and_impure_are_left_alone() {
        let eq_env = mono_ast::EqEnv::new();
        assert_eq!(erase(&eq_env, SourceLoc::dummy(), &well_known::pure_effect()), well_known::pure_effect());
        assert_eq!(erase(&eq_env, SourceLoc::dummy(), &well_known::impure_effect()), well_known::impure_effect());
    }

    #[test]
    fn assoc_apply_reduces_through_eq_env() {
        let mut eq_env = mono_ast::EqEnv::new();
        let assoc = Symbol::unqualified("Elem");
        eq_env.insert(assoc.clone(), well_known::unit(), well_known::pure_effect());
        let t = Type::AssocApply { assoc: assoc.clone(), arg: Box::new(well_known::unit()) };
        assert_eq!(erase(&eq_env, SourceLoc::dummy(), &t), well_known::pure_effect());
    }

    #[test]
    #[should_panic]
    fn assoc_apply_without_reduction_is_ice() {
        let eq_env = mono_ast::EqEnv::new();
        let t = Type::AssocApply { assoc: Symbol::unqualified("Elem"), arg: Box::new(well_known::unit()) };
        erase(&eq_env, SourceLoc::dummy(), &t);
    }
}
