//! Trait resolution (C5): maps a signature reference at a concrete type to
//! the concrete definition that should be specialized in its place
//! (SPEC_FULL.md §4.5).

use mono_ast::{Def, Root, Sig, Type};
use mono_common::{InternalError, SourceLoc, ice};

/// Resolves `sig` at `demanded` against `root`'s trait instances, returning
/// the source-level `Def` the caller should hand to the registry/specializer
/// for further specialization. Never returns a definition that has already
/// been specialized — freshening and memoization happen one layer up, in
/// `mono-specialize`.
pub fn resolve(root: &Root, sig: &Sig, demanded: &Type, loc: SourceLoc) -> Def {
    let empty = Vec::new();
    let instances = root.instances.get(&sig.trait_sym).unwrap_or(&empty);

    let matches: Vec<&Def> = instances
        .iter()
        .flat_map(|instance| instance.defs.iter())
        .filter(|def| def.sym.name() == sig.name.as_ref())
        .filter(|def| mono_solver::try_unify(&root.eq_env, &def.spec.scheme.base, demanded).is_some())
        .collect();

    match matches.len() {
        1 => {
            tracing::trace!(sig = %sig.sym, "resolved to a single instance");
            matches[0].clone()
        }
        0 => {
            tracing::trace!(sig = %sig.sym, "no instance matched, falling back to default body");
            synthesize_default(sig, loc)
        }
        n => ice(InternalError::AmbiguousInstances { trait_sym: sig.trait_sym.clone(), count: n, loc }),
    }
}

fn synthesize_default(sig: &Sig, loc: SourceLoc) -> Def {
    let Some(default_body) = &sig.default_body else {
        return ice(InternalError::MissingInstance { sig: sig.sym.clone(), loc });
    };
    // Namespace `trait.namespace ++ [trait.name]` (SPEC_FULL.md §4.5).
    let sym = sig.trait_sym.nested(sig.name.clone());
    Def { sym, spec: sig.spec.clone(), body: default_body.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mono_ast::{Constant, Expr, Instance, Kind, Modifiers, Scheme, Spec, TypeConstant, TypeVar, well_known};
    use mono_common::Symbol;

    fn spec_with_base(base: Type, tparams: Vec<TypeVar>) -> Spec {
        Spec {
            doc: None,
            annotations: vec![],
            modifiers: Modifiers::empty(),
            tparams,
            fparams: vec![],
            scheme: Scheme { tvars: vec![], constraints: vec![], base },
            return_type: well_known::unit(),
            effect: well_known::pure_effect(),
            trait_constraints: vec![],
            eq_constraints: vec![],
            loc: SourceLoc::dummy(),
        }
    }

    fn unit_expr() -> Expr {
        Expr::Constant { value: Constant::Unit, tpe: well_known::unit(), loc: SourceLoc::dummy() }
    }

    fn int_ty() -> Type {
        Type::Const(TypeConstant::new(Symbol::unqualified("Int"), Kind::Value))
    }

    #[test]
    fn exactly_one_instance_match_resolves_to_that_def() {
        let mut root = Root::new();
        let trait_sym = Symbol::unqualified("Show");
        let member_sym = Symbol::new(["Show"], "show");
        let instance_def = Def { sym: member_sym, spec: spec_with_base(int_ty(), vec![]), body: unit_expr() };
        root.instances.insert(trait_sym.clone(), vec![Instance { trait_sym: trait_sym.clone(), tpe: int_ty(), defs: vec![instance_def.clone()], loc: SourceLoc::dummy() }]);

        let sig = Sig {
            sym: Symbol::new(["Show"], "show"),
            trait_sym,
            name: std::sync::Arc::from("show"),
            spec: spec_with_base(Type::Var(TypeVar::new(0, Kind::Value)), vec![TypeVar::new(0, Kind::Value)]),
            default_body: None,
        };

        let resolved = resolve(&root, &sig, &int_ty(), SourceLoc::dummy());
        assert_eq!(resolved.sym, instance_def.sym);
    }

    #[test]
    fn no_instance_with_default_body_synthesizes_def_in_trait_namespace() {
        let root = Root::new();
        let trait_sym = Symbol::unqualified("Greet");
        let sig = Sig {
            sym: Symbol::new(["Greet"], "greet"),
            trait_sym: trait_sym.clone(),
            name: std::sync::Arc::from("greet"),
            spec: spec_with_base(Type::Var(TypeVar::new(0, Kind::Value)), vec![TypeVar::new(0, Kind::Value)]),
            default_body: Some(unit_expr()),
        };

        let resolved = resolve(&root, &sig, &int_ty(), SourceLoc::dummy());
        assert_eq!(resolved.sym.namespace(), [std::sync::Arc::<str>::from("Greet")]);
        assert_eq!(resolved.sym.name(), "greet");
    }

    #[test]
    #[should_panic]
    fn no_instance_and_no_default_is_ice() {
        let root = Root::new();
        let trait_sym = Symbol::unqualified("Greet");
        let sig = Sig {
            sym: Symbol::new(["Greet"], "greet"),
            trait_sym,
            name: std::sync::Arc::from("greet"),
            spec: spec_with_base(Type::Var(TypeVar::new(0, Kind::Value)), vec![TypeVar::new(0, Kind::Value)]),
            default_body: None,
        };
        resolve(&root, &sig, &int_ty(), SourceLoc::dummy());
    }

    #[test]
    #[should_panic]
    fn multiple_instance_matches_is_ice() {
        let mut root = Root::new();
        let trait_sym = Symbol::unqualified("Show");
        let member = |n: &str| Def { sym: Symbol::new(["Show"], n), spec: spec_with_base(int_ty(), vec![]), body: unit_expr() };
        root.instances.insert(
            trait_sym.clone(),
            vec![
                Instance { trait_sym: trait_sym.clone(), tpe: int_ty(), defs: vec![member("show")], loc: SourceLoc::dummy() },
                Instance { trait_sym: trait_sym.clone(), tpe: int_ty(), defs: vec![member("show")], loc: SourceLoc::dummy() },
            ],
        );
        let sig = Sig {
            sym: Symbol::new(["Show"], "show"),
            trait_sym,
            name: std::sync::Arc::from("show"),
            spec: spec_with_base(Type::Var(TypeVar::new(0, Kind::Value)), vec![TypeVar::new(0, Kind::Value)]),
            default_body: None,
        };
        resolve(&root, &sig, &int_ty(), SourceLoc::dummy());
    }
}
