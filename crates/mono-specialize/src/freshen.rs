//! Local-binder freshening (SPEC_FULL.md §4.8): every `let`/lambda/pattern/
//! handler/catch binder in a definition's body gets a brand new
//! `LocalSymbol` each time the definition is specialized, so that two
//! specializations of the same source definition never alias each other's
//! locals.

use mono_ast::{EqEnv, FormalParam, Pattern};
use mono_common::{FxHashMap, InternalError, LocalSymbol, SourceLoc, ice};
use mono_solver::StrictSubst;

/// Maps a source definition's local binder ids to the fresh symbols minted
/// for the specialization currently in progress. Scoped to one
/// `specialize_work_item` call; never shared across definitions.
pub type Env = FxHashMap<u64, LocalSymbol>;

/// Mints a fresh symbol for `old` and records the mapping.
pub fn bind(env: &mut Env, old: &LocalSymbol) -> LocalSymbol {
    let fresh = LocalSymbol::fresh(old.hint().to_string());
    env.insert(old.id(), fresh.clone());
    fresh
}

/// Looks up the fresh symbol standing in for `old`. A miss means the source
/// body references a local that was never bound in this definition, which
/// is a bug upstream of this pass.
pub fn lookup(env: &Env, old: &LocalSymbol, loc: SourceLoc) -> LocalSymbol {
    env.get(&old.id()).cloned().unwrap_or_else(|| ice(InternalError::UnboundVariable { sym: old.to_string(), loc }))
}

pub fn freshen_formal(env: &mut Env, eq_env: &EqEnv, subst: &StrictSubst, fp: &FormalParam) -> FormalParam {
    let sym = bind(env, &fp.sym);
    FormalParam { sym, tpe: subst.apply(eq_env, fp.loc, &fp.tpe), loc: fp.loc }
}

pub fn freshen_pattern(env: &mut Env, eq_env: &EqEnv, subst: &StrictSubst, pat: &Pattern) -> Pattern {
    match pat {
        Pattern::Wildcard { tpe, loc } => Pattern::Wildcard { tpe: subst.apply(eq_env, *loc, tpe), loc: *loc },
        Pattern::Var { sym, tpe, loc } => Pattern::Var { sym: bind(env, sym), tpe: subst.apply(eq_env, *loc, tpe), loc: *loc },
        Pattern::Constant { value, tpe, loc } => Pattern::Constant { value: value.clone(), tpe: subst.apply(eq_env, *loc, tpe), loc: *loc },
        Pattern::Tag { sym, arg, tpe, loc } => Pattern::Tag {
            sym: sym.clone(),
            arg: Box::new(freshen_pattern(env, eq_env, subst, arg)),
            tpe: subst.apply(eq_env, *loc, tpe),
            loc: *loc,
        },
        Pattern::Tuple { elems, tpe, loc } => Pattern::Tuple {
            elems: elems.iter().map(|e| freshen_pattern(env, eq_env, subst, e)).collect(),
            tpe: subst.apply(eq_env, *loc, tpe),
            loc: *loc,
        },
        Pattern::Record { labels, tail, tpe, loc } => Pattern::Record {
            labels: labels.iter().map(|(label, p)| (label.clone(), freshen_pattern(env, eq_env, subst, p))).collect(),
            tail: Box::new(freshen_pattern(env, eq_env, subst, tail)),
            tpe: subst.apply(eq_env, *loc, tpe),
            loc: *loc,
        },
        Pattern::EmptyRecord { tpe, loc } => Pattern::EmptyRecord { tpe: subst.apply(eq_env, *loc, tpe), loc: *loc },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_then_lookup_round_trips() {
        let mut env = Env::default();
        let old = LocalSymbol::fresh("x");
        let fresh = bind(&mut env, &old);
        assert_eq!(lookup(&env, &old, SourceLoc::dummy()), fresh);
    }

    #[test]
    #[should_panic]
    fn lookup_of_unbound_local_is_ice() {
        let env = Env::default();
        lookup(&env, &LocalSymbol::fresh("y"), SourceLoc::dummy());
    }
}
