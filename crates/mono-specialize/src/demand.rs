//! The demand algorithm (SPEC_FULL.md §4.7, §4.9): turn a reference to a
//! polymorphic definition or trait signature, at some concrete type, into
//! the symbol of its (possibly not-yet-built) specialization, enqueuing the
//! work if this is the first time that `(source, erased type)` pair has
//! been demanded.

use mono_ast::{Def, EqEnv, Root, Sig, Type};
use mono_common::{SourceLoc, Symbol};
use mono_registry::{Registry, WorkItem};

/// Shared by `demand_def`/`demand_sig`: `erased` has already been passed
/// through `mono_solver::erase`, and identifies the memo key together with
/// `def.sym`.
fn demand_erased(registry: &Registry, eq_env: &EqEnv, def: &Def, erased: Type, loc: SourceLoc) -> Symbol {
    let source = def.sym.clone();
    let (fresh, is_new) = registry.demand(source, erased.clone(), || def.sym.freshen());
    if is_new {
        let outcome = mono_solver::unify(eq_env, loc, &def.spec.scheme.base, &erased);
        registry.enqueue(WorkItem { fresh_sym: fresh.clone(), def: def.clone(), subst: outcome.subst });
    }
    fresh
}

/// Demands a specialization of `def` at `demanded` (not yet erased).
pub fn demand_def(registry: &Registry, eq_env: &EqEnv, def: &Def, demanded: &Type, loc: SourceLoc) -> Symbol {
    let erased = mono_solver::erase(eq_env, loc, demanded);
    demand_erased(registry, eq_env, def, erased, loc)
}

/// Demands a specialization of the definition that `sig` resolves to at
/// `demanded` (not yet erased): first resolves the trait reference to a
/// concrete `Def` (`mono-resolve`), then demands that as usual.
pub fn demand_sig(registry: &Registry, root: &Root, sig: &Sig, demanded: &Type, loc: SourceLoc) -> Symbol {
    let erased = mono_solver::erase(&root.eq_env, loc, demanded);
    let resolved = mono_resolve::resolve(root, sig, &erased, loc);
    demand_erased(registry, &root.eq_env, &resolved, erased, loc)
}
