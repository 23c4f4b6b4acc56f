//! Type erasure (C1), strict substitution (C2), and unification (C3) for
//! the monomorphization pass. No symbol freshening, registry, or AST rewrite
//! logic lives here — this crate only ever answers "what does this type
//! become" questions.

mod boolean_algebra;
mod eraser;
mod strict_subst;
mod unify;

pub use eraser::{default_for_kind, erase};
pub use strict_subst::StrictSubst;
pub use unify::{UnifyOutcome, try_unify, try_unify_rigid, unify};

/// Effect union via the Boolean lattice's smart constructors, exposed for
/// the specializer's `TypeMatch` result-effect computation (SPEC_FULL.md
/// §4.6): the result effect is the union of every rule body's effect.
#[must_use]
pub fn union_effect(a: &mono_ast::Type, b: &mono_ast::Type) -> mono_ast::Type {
    boolean_algebra::union(a.clone(), b.clone())
}
