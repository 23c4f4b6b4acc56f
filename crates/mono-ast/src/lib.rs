//! The typed, effect-annotated IR the monomorphization pass consumes and
//! produces. This crate is data-only: no unification, substitution, or
//! rewrite logic lives here (see `mono-solver` and `mono-specialize`).

mod decl;
mod expr;
mod pattern;
mod spec;
mod types;

pub use decl::{Def, EqEnv, Instance, Root, Sig, TraitDecl, TypeAliasDecl};
pub use expr::{AtomicOp, CatchRule, Constant, Expr, FormalParam, HandlerRule, MatchRule, ObjectMethod, TypeMatchRule};
pub use pattern::Pattern;
pub use spec::{EqConstraint, Modifiers, Scheme, Spec, TraitConstraint};
pub use types::{Kind, Type, TypeConstant, TypeVar, well_known};

#[cfg(test)]
mod tests {
    use super::*;
    use mono_common::Symbol;

    #[test]
    fn spine_splits_curried_application() {
        let head = Type::Const(TypeConstant::new(Symbol::unqualified("Union"), Kind::Effect));
        let a = well_known::pure_effect();
        let b = well_known::impure_effect();
        let applied = head.clone().apply(a.clone()).apply(b.clone());
        let (spine_head, args) = applied.spine();
        assert_eq!(*spine_head, head);
        assert_eq!(args, vec![&a, &b]);
    }

    #[test]
    fn non_parametric_defs_filters_by_tparams() {
        let mut root = Root::new();
        let mono_spec = Spec {
            doc: None,
            annotations: vec![],
            modifiers: Modifiers::empty(),
            tparams: vec![],
            fparams: vec![],
            scheme: Scheme { tvars: vec![], constraints: vec![], base: well_known::unit() },
            return_type: well_known::unit(),
            effect: well_known::pure_effect(),
            trait_constraints: vec![],
            eq_constraints: vec![],
            loc: mono_common::SourceLoc::dummy(),
        };
        let mut poly_spec = mono_spec.clone();
        poly_spec.tparams = vec![TypeVar::new(0, Kind::Value)];

        let mono_sym = Symbol::unqualified("main");
        let poly_sym = Symbol::unqualified("id");
        root.defs.insert(
            mono_sym.clone(),
            Def {
                sym: mono_sym.clone(),
                spec: mono_spec,
                body: Expr::Constant { value: Constant::Unit, tpe: well_known::unit(), loc: mono_common::SourceLoc::dummy() },
            },
        );
        root.defs.insert(
            poly_sym.clone(),
            Def {
                sym: poly_sym,
                spec: poly_spec,
                body: Expr::Constant { value: Constant::Unit, tpe: well_known::unit(), loc: mono_common::SourceLoc::dummy() },
            },
        );

        let seeds: Vec<_> = root.non_parametric_defs().map(|d| d.sym.clone()).collect();
        assert_eq!(seeds, vec![mono_sym]);
    }
}
