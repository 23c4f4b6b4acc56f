//! The expression specializer (C6, SPEC_FULL.md §4.6): rewrites one
//! definition's body under a strict substitution, freshening every local
//! binder and turning every `Def`/`Sig` reference into a demand against the
//! shared registry.

use crate::demand::{demand_def, demand_sig};
use crate::freshen::{Env, bind, freshen_formal, freshen_pattern, lookup};
use mono_ast::{CatchRule, Expr, FormalParam, HandlerRule, MatchRule, ObjectMethod, Root, Scheme, Spec, Type, TypeMatchRule, well_known};
use mono_common::{FxHashSet, InternalError, SourceLoc, ice};
use mono_registry::{Registry, WorkItem};
use mono_solver::StrictSubst;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Everything the specializer needs beyond the work item itself: the source
/// program (definition/signature lookup, trait resolution) and the shared
/// queue/memo table that further demands get enqueued into. `trait_resolutions`
/// counts `Sig` references resolved, for the driver's `PassStats`.
pub struct SpecCtx<'a> {
    pub root: &'a Root,
    pub registry: &'a Registry,
    trait_resolutions: AtomicUsize,
}

impl<'a> SpecCtx<'a> {
    #[must_use]
    pub fn new(root: &'a Root, registry: &'a Registry) -> Self {
        SpecCtx { root, registry, trait_resolutions: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn trait_resolutions(&self) -> usize {
        self.trait_resolutions.load(Ordering::Relaxed)
    }
}

/// Specializes one `WorkItem` into a finished, fully-monomorphic `Def`
/// (SPEC_FULL.md §4.6-§4.8).
pub fn specialize_work_item(ctx: &SpecCtx, item: WorkItem) -> mono_ast::Def {
    let WorkItem { fresh_sym, def, subst } = item;
    tracing::trace!(source = %def.sym, fresh = %fresh_sym, "specializing work item body");
    let eq_env = &ctx.root.eq_env;
    let mut env = Env::default();

    let fparams: Vec<FormalParam> = def.spec.fparams.iter().map(|fp| freshen_formal(&mut env, eq_env, &subst, fp)).collect();
    let body = rewrite_expr(ctx, &mut env, &subst, &def.body);

    let spec = Spec {
        doc: def.spec.doc.clone(),
        annotations: def.spec.annotations.clone(),
        modifiers: def.spec.modifiers,
        tparams: vec![],
        fparams,
        scheme: Scheme { tvars: vec![], constraints: vec![], base: subst.apply(eq_env, def.spec.loc, &def.spec.scheme.base) },
        return_type: subst.apply(eq_env, def.spec.loc, &def.spec.return_type),
        effect: subst.apply(eq_env, def.spec.loc, &def.spec.effect),
        trait_constraints: vec![],
        eq_constraints: vec![],
        loc: def.spec.loc,
    };
    mono_ast::Def { sym: fresh_sym, spec, body }
}

fn rewrite_expr(ctx: &SpecCtx, env: &mut Env, subst: &StrictSubst, expr: &Expr) -> Expr {
    let eq_env = &ctx.root.eq_env;
    match expr {
        Expr::Var { sym, tpe, loc } => Expr::Var { sym: lookup(env, sym, *loc), tpe: subst.apply(eq_env, *loc, tpe), loc: *loc },

        Expr::Def { sym, tpe, loc } => {
            let demanded = subst.apply(eq_env, *loc, tpe);
            let source_def = ctx.root.defs.get(sym).unwrap_or_else(|| ice(InternalError::UnboundVariable { sym: sym.to_string(), loc: *loc }));
            let fresh = demand_def(ctx.registry, eq_env, source_def, &demanded, *loc);
            Expr::Def { sym: fresh, tpe: demanded, loc: *loc }
        }

        Expr::Sig { sym, tpe, loc } => {
            let demanded = subst.apply(eq_env, *loc, tpe);
            let sig = ctx.root.sigs.get(sym).unwrap_or_else(|| ice(InternalError::UnboundVariable { sym: sym.to_string(), loc: *loc }));
            let fresh = demand_sig(ctx.registry, ctx.root, sig, &demanded, *loc);
            ctx.trait_resolutions.fetch_add(1, Ordering::Relaxed);
            Expr::Def { sym: fresh, tpe: demanded, loc: *loc }
        }

        Expr::Constant { value, tpe, loc } => Expr::Constant { value: value.clone(), tpe: subst.apply(eq_env, *loc, tpe), loc: *loc },

        Expr::Lambda { fparam, body, tpe, eff, loc } => {
            let fparam2 = freshen_formal(env, eq_env, subst, fparam);
            let body2 = rewrite_expr(ctx, env, subst, body);
            Expr::Lambda { fparam: fparam2, body: Box::new(body2), tpe: subst.apply(eq_env, *loc, tpe), eff: subst.apply(eq_env, *loc, eff), loc: *loc }
        }

        Expr::Apply { func, arg, tpe, eff, loc } => Expr::Apply {
            func: Box::new(rewrite_expr(ctx, env, subst, func)),
            arg: Box::new(rewrite_expr(ctx, env, subst, arg)),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::ApplyAtomic { op, args, tpe, eff, loc } => Expr::ApplyAtomic {
            op: op.clone(),
            args: args.iter().map(|a| rewrite_expr(ctx, env, subst, a)).collect(),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::Let { sym, bound, body, tpe, eff, loc } => {
            let bound2 = rewrite_expr(ctx, env, subst, bound);
            let sym2 = bind(env, sym);
            let body2 = rewrite_expr(ctx, env, subst, body);
            Expr::Let { sym: sym2, bound: Box::new(bound2), body: Box::new(body2), tpe: subst.apply(eq_env, *loc, tpe), eff: subst.apply(eq_env, *loc, eff), loc: *loc }
        }

        Expr::LetRec { sym, bound, body, tpe, eff, loc } => {
            let sym2 = bind(env, sym);
            let bound2 = rewrite_expr(ctx, env, subst, bound);
            let body2 = rewrite_expr(ctx, env, subst, body);
            Expr::LetRec { sym: sym2, bound: Box::new(bound2), body: Box::new(body2), tpe: subst.apply(eq_env, *loc, tpe), eff: subst.apply(eq_env, *loc, eff), loc: *loc }
        }

        Expr::Scope { sym, region, body, tpe, eff, loc } => {
            let inner_subst = subst.unbind(region).extend(region.clone(), well_known::impure_effect());
            let sym2 = bind(env, sym);
            let body2 = rewrite_expr(ctx, env, &inner_subst, body);
            Expr::Scope { sym: sym2, region: region.clone(), body: Box::new(body2), tpe: subst.apply(eq_env, *loc, tpe), eff: subst.apply(eq_env, *loc, eff), loc: *loc }
        }

        Expr::IfThenElse { cond, then_branch, else_branch, tpe, eff, loc } => Expr::IfThenElse {
            cond: Box::new(rewrite_expr(ctx, env, subst, cond)),
            then_branch: Box::new(rewrite_expr(ctx, env, subst, then_branch)),
            else_branch: Box::new(rewrite_expr(ctx, env, subst, else_branch)),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::Stm { first, rest, tpe, eff, loc } => Expr::Stm {
            first: Box::new(rewrite_expr(ctx, env, subst, first)),
            rest: Box::new(rewrite_expr(ctx, env, subst, rest)),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::Discard { expr: inner, eff, loc } => {
            Expr::Discard { expr: Box::new(rewrite_expr(ctx, env, subst, inner)), eff: subst.apply(eq_env, *loc, eff), loc: *loc }
        }

        Expr::Match { scrutinee, rules, tpe, eff, loc } => {
            let scrutinee2 = rewrite_expr(ctx, env, subst, scrutinee);
            let rules2: Vec<MatchRule> = rules
                .iter()
                .map(|rule| {
                    let mut rule_env = env.clone();
                    let pat2 = freshen_pattern(&mut rule_env, eq_env, subst, &rule.pat);
                    let guard2 = rule.guard.as_ref().map(|g| rewrite_expr(ctx, &mut rule_env, subst, g));
                    let body2 = rewrite_expr(ctx, &mut rule_env, subst, &rule.body);
                    MatchRule { pat: pat2, guard: guard2, body: body2 }
                })
                .collect();
            Expr::Match { scrutinee: Box::new(scrutinee2), rules: rules2, tpe: subst.apply(eq_env, *loc, tpe), eff: subst.apply(eq_env, *loc, eff), loc: *loc }
        }

        Expr::TypeMatch { scrutinee, rules, tpe, loc, .. } => rewrite_type_match(ctx, env, subst, scrutinee, rules, tpe, *loc),

        Expr::VectorLit { elems, tpe, eff, loc } => Expr::VectorLit {
            elems: elems.iter().map(|e| rewrite_expr(ctx, env, subst, e)).collect(),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::VectorLoad { base, index, tpe, eff, loc } => Expr::VectorLoad {
            base: Box::new(rewrite_expr(ctx, env, subst, base)),
            index: Box::new(rewrite_expr(ctx, env, subst, index)),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::VectorLength { base, tpe, eff, loc } => Expr::VectorLength {
            base: Box::new(rewrite_expr(ctx, env, subst, base)),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::Ascribe { expr: inner, tpe, eff, loc } => Expr::Ascribe {
            expr: Box::new(rewrite_expr(ctx, env, subst, inner)),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::Cast { expr: inner, tpe, eff, loc } => Expr::Cast {
            expr: Box::new(rewrite_expr(ctx, env, subst, inner)),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::TryCatch { expr: inner, rules, tpe, eff, loc } => {
            let inner2 = rewrite_expr(ctx, env, subst, inner);
            let rules2: Vec<CatchRule> = rules
                .iter()
                .map(|rule| {
                    let mut rule_env = env.clone();
                    let sym2 = bind(&mut rule_env, &rule.sym);
                    let body2 = rewrite_expr(ctx, &mut rule_env, subst, &rule.body);
                    CatchRule { sym: sym2, exception_tpe: subst.apply(eq_env, *loc, &rule.exception_tpe), body: body2 }
                })
                .collect();
            Expr::TryCatch { expr: Box::new(inner2), rules: rules2, tpe: subst.apply(eq_env, *loc, tpe), eff: subst.apply(eq_env, *loc, eff), loc: *loc }
        }

        Expr::TryWith { effect_sym, expr: inner, rules, tpe, eff, loc } => {
            let inner2 = rewrite_expr(ctx, env, subst, inner);
            let rules2: Vec<HandlerRule> = rules
                .iter()
                .map(|rule| {
                    let mut rule_env = env.clone();
                    let fparams2: Vec<FormalParam> = rule.fparams.iter().map(|fp| freshen_formal(&mut rule_env, eq_env, subst, fp)).collect();
                    let continuation2 = freshen_formal(&mut rule_env, eq_env, subst, &rule.continuation);
                    let body2 = rewrite_expr(ctx, &mut rule_env, subst, &rule.body);
                    HandlerRule { op_sym: rule.op_sym.clone(), fparams: fparams2, continuation: continuation2, body: body2 }
                })
                .collect();
            Expr::TryWith {
                effect_sym: effect_sym.clone(),
                expr: Box::new(inner2),
                rules: rules2,
                tpe: subst.apply(eq_env, *loc, tpe),
                eff: subst.apply(eq_env, *loc, eff),
                loc: *loc,
            }
        }

        Expr::Do { op_sym, effect_sym, args, tpe, eff, loc } => Expr::Do {
            op_sym: op_sym.clone(),
            effect_sym: effect_sym.clone(),
            args: args.iter().map(|a| rewrite_expr(ctx, env, subst, a)).collect(),
            tpe: subst.apply(eq_env, *loc, tpe),
            eff: subst.apply(eq_env, *loc, eff),
            loc: *loc,
        },

        Expr::NewObject { methods, tpe, eff, loc } => {
            let methods2: Vec<ObjectMethod> = methods
                .iter()
                .map(|m| {
                    let mut method_env = env.clone();
                    let fparams2: Vec<FormalParam> = m.spec.fparams.iter().map(|fp| freshen_formal(&mut method_env, eq_env, subst, fp)).collect();
                    let mut spec2 = m.spec.clone();
                    spec2.fparams = fparams2;
                    spec2.return_type = subst.apply(eq_env, *loc, &m.spec.return_type);
                    spec2.effect = subst.apply(eq_env, *loc, &m.spec.effect);
                    let body2 = rewrite_expr(ctx, &mut method_env, subst, &m.body);
                    ObjectMethod { sym: m.sym.clone(), spec: spec2, body: body2 }
                })
                .collect();
            Expr::NewObject { methods: methods2, tpe: subst.apply(eq_env, *loc, tpe), eff: subst.apply(eq_env, *loc, eff), loc: *loc }
        }
    }
}

/// The type-match rigidity algorithm (SPEC_FULL.md §4.6): a rule matches
/// only if the scrutinee's *actual* free variables (not their erasure
/// defaults) unify with the rule's declared type while staying rigid —
/// bound only to themselves. Both sides of that unification must stay
/// non-strict: defaulting either one before the test would let a fresh
/// scrutinee type (e.g. `List[a]`) collapse to its erasure default and
/// spuriously match a concrete rule (`List[Unit]`), which is exactly what
/// rigidity exists to reject. The first matching rule wins and the whole
/// expression collapses to a `Let` binding the rule's pattern variable to
/// the (already rewritten) scrutinee; the result type is the match's own
/// declared type under the ambient substitution, not the chosen branch's
/// inferred type.
fn rewrite_type_match(ctx: &SpecCtx, env: &mut Env, subst: &StrictSubst, scrutinee: &Expr, rules: &[TypeMatchRule], result_tpe: &Type, loc: SourceLoc) -> Expr {
    let eq_env = &ctx.root.eq_env;
    let rewritten_scrutinee = rewrite_expr(ctx, env, subst, scrutinee);

    let raw_scrutinee_ty = subst.raw_apply(eq_env, loc, &scrutinee.tpe());
    let mut free = Vec::new();
    raw_scrutinee_ty.free_vars(&mut free);
    let rigid: FxHashSet<_> = free.into_iter().collect();

    let scrutinee_eff = rewritten_scrutinee.eff();

    for rule in rules {
        let raw_rule_ty = subst.raw_apply(eq_env, loc, &rule.tpe);
        if let Some(outcome) = mono_solver::try_unify_rigid(eq_env, &rigid, &raw_scrutinee_ty, &raw_rule_ty) {
            let case_subst = subst.compose_extend(&outcome.subst);
            let mut rule_env = env.clone();
            let sym2 = bind(&mut rule_env, &rule.sym);
            let body2 = rewrite_expr(ctx, &mut rule_env, &case_subst, &rule.body);
            let body_eff = body2.eff();
            return Expr::Let {
                sym: sym2,
                bound: Box::new(rewritten_scrutinee),
                body: Box::new(body2),
                tpe: subst.apply(eq_env, loc, result_tpe),
                eff: mono_solver::union_effect(&scrutinee_eff, &body_eff),
                loc,
            };
        }
    }

    ice(InternalError::UnificationFailure { loc, lhs: format!("{raw_scrutinee_ty:?}"), rhs: format!("none of {} type-match rules", rules.len()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mono_ast::{Constant, EqEnv, Kind, Modifiers, Sig, TypeConstant, TypeVar};
    use mono_common::{LocalSymbol, Symbol};

    fn int_ty() -> Type {
        Type::Const(TypeConstant::new(Symbol::unqualified("Int"), Kind::Value))
    }

    fn bool_ty() -> Type {
        Type::Const(TypeConstant::new(Symbol::unqualified("Bool"), Kind::Value))
    }

    fn dummy_spec(tparams: Vec<TypeVar>, fparams: Vec<FormalParam>, base: Type) -> Spec {
        Spec {
            doc: None,
            annotations: vec![],
            modifiers: Modifiers::empty(),
            tparams,
            fparams,
            scheme: Scheme { tvars: vec![], constraints: vec![], base },
            return_type: well_known::unit(),
            effect: well_known::pure_effect(),
            trait_constraints: vec![],
            eq_constraints: vec![],
            loc: SourceLoc::dummy(),
        }
    }

    #[test]
    fn identity_def_specialized_twice_at_the_same_type_reuses_the_symbol() {
        let v = TypeVar::new(0, Kind::Value);
        let x = LocalSymbol::fresh("x");
        let fparam = FormalParam { sym: x.clone(), tpe: Type::Var(v.clone()), loc: SourceLoc::dummy() };
        let def = mono_ast::Def {
            sym: Symbol::unqualified("id"),
            spec: dummy_spec(vec![v.clone()], vec![fparam], Type::Var(v.clone())),
            body: Expr::Var { sym: x, tpe: Type::Var(v), loc: SourceLoc::dummy() },
        };

        let mut root = Root::new();
        root.defs.insert(def.sym.clone(), def.clone());
        let registry = Registry::new();
        let ctx = SpecCtx::new(&root, &registry);

        let first = demand_def(&registry, &root.eq_env, &def, &int_ty(), SourceLoc::dummy());
        let second = demand_def(&registry, &root.eq_env, &def, &int_ty(), SourceLoc::dummy());
        assert_eq!(first, second);

        let pending = registry.drain_pending();
        assert_eq!(pending.len(), 1);
        let specialized = specialize_work_item(&ctx, pending.into_iter().next().unwrap());
        assert_eq!(specialized.sym, first);
        assert_eq!(specialized.body.tpe(), int_ty());
    }

    #[test]
    fn specializing_two_different_demand_types_produces_two_distinct_specializations() {
        let v = TypeVar::new(0, Kind::Value);
        let x = LocalSymbol::fresh("x");
        let fparam = FormalParam { sym: x.clone(), tpe: Type::Var(v.clone()), loc: SourceLoc::dummy() };
        let def = mono_ast::Def {
            sym: Symbol::unqualified("id"),
            spec: dummy_spec(vec![v.clone()], vec![fparam], Type::Var(v.clone())),
            body: Expr::Var { sym: x, tpe: Type::Var(v), loc: SourceLoc::dummy() },
        };

        let registry = Registry::new();
        let eq_env = EqEnv::new();
        let at_int = demand_def(&registry, &eq_env, &def, &int_ty(), SourceLoc::dummy());
        let at_bool = demand_def(&registry, &eq_env, &def, &bool_ty(), SourceLoc::dummy());
        assert_ne!(at_int, at_bool);
        assert_eq!(registry.drain_pending().len(), 2);
    }

    #[test]
    fn scope_rebinds_its_region_to_impure_for_the_body() {
        let region = TypeVar::new(9, Kind::Effect);
        let s = LocalSymbol::fresh("s");
        let def = mono_ast::Def {
            sym: Symbol::unqualified("runner"),
            spec: dummy_spec(vec![], vec![], well_known::unit()),
            body: Expr::Scope {
                sym: s.clone(),
                region: region.clone(),
                body: Box::new(Expr::Constant { value: Constant::Unit, tpe: well_known::unit(), loc: SourceLoc::dummy() }),
                tpe: well_known::unit(),
                eff: Type::Var(region),
                loc: SourceLoc::dummy(),
            },
        };

        let root = Root::new();
        let registry = Registry::new();
        let ctx = SpecCtx::new(&root, &registry);
        let item = WorkItem { fresh_sym: def.sym.freshen(), def, subst: StrictSubst::empty() };
        let specialized = specialize_work_item(&ctx, item);
        assert_eq!(specialized.body.eff(), well_known::impure_effect());
    }

    #[test]
    fn trait_reference_with_no_instance_specializes_the_synthesized_default_body() {
        let trait_sym = Symbol::unqualified("Greet");
        let sig = Sig {
            sym: Symbol::new(["Greet"], "greet"),
            trait_sym: trait_sym.clone(),
            name: std::sync::Arc::from("greet"),
            spec: dummy_spec(vec![TypeVar::new(0, Kind::Value)], vec![], Type::Var(TypeVar::new(0, Kind::Value))),
            default_body: Some(Expr::Constant { value: Constant::Unit, tpe: well_known::unit(), loc: SourceLoc::dummy() }),
        };
        let mut root = Root::new();
        root.sigs.insert(sig.sym.clone(), sig.clone());
        let registry = Registry::new();
        let ctx = SpecCtx::new(&root, &registry);

        let caller = mono_ast::Def {
            sym: Symbol::unqualified("main"),
            spec: dummy_spec(vec![], vec![], well_known::unit()),
            body: Expr::Sig { sym: sig.sym.clone(), tpe: Type::Var(TypeVar::new(0, Kind::Value)), loc: SourceLoc::dummy() },
        };
        let item = WorkItem { fresh_sym: caller.sym.freshen(), def: caller, subst: StrictSubst::empty().extend(TypeVar::new(0, Kind::Value), int_ty()) };
        specialize_work_item(&ctx, item);

        let pending = registry.drain_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].def.sym.namespace(), [std::sync::Arc::<str>::from("Greet")]);
    }

    fn list_of(elem: Type) -> Type {
        Type::Const(TypeConstant::new(Symbol::unqualified("List"), Kind::Value)).apply(elem)
    }

    #[test]
    #[should_panic]
    fn type_match_rejects_a_rule_an_unconstrained_scrutinee_would_only_match_by_erasing() {
        let root = Root::new();
        let registry = Registry::new();
        let ctx = SpecCtx::new(&root, &registry);
        let mut env = Env::default();
        let subst = StrictSubst::empty();

        // The scrutinee's declared type is `List[a]` for a free `a`; under
        // strict substitution it would erase to `List[Unit]`, which is
        // exactly what the one rule below is declared for. Rigidity must
        // reject that match rather than let the erasure default stand in
        // for the fresh variable.
        let a = TypeVar::new(0, Kind::Value);
        let scrutinee = Expr::Constant { value: Constant::Unit, tpe: list_of(Type::Var(a)), loc: SourceLoc::dummy() };
        let rule = TypeMatchRule {
            sym: LocalSymbol::fresh("elem"),
            tpe: list_of(well_known::unit()),
            body: Expr::Constant { value: Constant::Unit, tpe: well_known::unit(), loc: SourceLoc::dummy() },
        };

        rewrite_type_match(&ctx, &mut env, &subst, &scrutinee, &[rule], &well_known::unit(), SourceLoc::dummy());
    }

    #[test]
    fn type_match_result_type_is_the_declared_tpe_not_the_matched_branchs_body_type() {
        let root = Root::new();
        let registry = Registry::new();
        let ctx = SpecCtx::new(&root, &registry);
        let mut env = Env::default();
        let subst = StrictSubst::empty();

        let scrutinee = Expr::Constant { value: Constant::Unit, tpe: bool_ty(), loc: SourceLoc::dummy() };
        let rule = TypeMatchRule {
            sym: LocalSymbol::fresh("b"),
            tpe: bool_ty(),
            // Deliberately a different type than the match's own declared
            // result, so the assertion below can tell the two apart.
            body: Expr::Constant { value: Constant::Unit, tpe: int_ty(), loc: SourceLoc::dummy() },
        };

        let result = rewrite_type_match(&ctx, &mut env, &subst, &scrutinee, &[rule], &bool_ty(), SourceLoc::dummy());
        assert_eq!(result.tpe(), bool_ty());
    }
}
