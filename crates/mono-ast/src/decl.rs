use crate::expr::Expr;
use crate::spec::Spec;
use crate::types::{Type, TypeVar};
use mono_common::{FxHashMap, SourceLoc, Symbol};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Def {
    pub sym: Symbol,
    pub spec: Spec,
    pub body: Expr,
}

/// A trait signature. `trait_sym` names the owning trait; `name` is the
/// unqualified member name the resolver matches against instance bodies
/// (SPEC_FULL.md §4.5).
#[derive(Clone, Debug)]
pub struct Sig {
    pub sym: Symbol,
    pub trait_sym: Symbol,
    pub name: Arc<str>,
    pub spec: Spec,
    pub default_body: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct Instance {
    pub trait_sym: Symbol,
    pub tpe: Type,
    pub defs: Vec<Def>,
    pub loc: SourceLoc,
}

#[derive(Clone, Debug)]
pub struct TraitDecl {
    pub sym: Symbol,
    pub namespace: Vec<Arc<str>>,
    pub name: Arc<str>,
    pub sigs: Vec<Symbol>,
}

#[derive(Clone, Debug)]
pub struct TypeAliasDecl {
    pub sym: Symbol,
    pub tparams: Vec<TypeVar>,
    pub tpe: Type,
}

/// The read-only associated-type reduction environment (SPEC_FULL.md §3,
/// §6): `(assoc_sym, concrete_arg) -> reduced_type`. Populated by the
/// upstream type inferencer; this pass never writes to it.
#[derive(Clone, Debug, Default)]
pub struct EqEnv {
    reductions: FxHashMap<(Symbol, Type), Type>,
}

impl EqEnv {
    #[must_use]
    pub fn new() -> Self {
        EqEnv::default()
    }

    pub fn insert(&mut self, assoc: Symbol, arg: Type, result: Type) {
        self.reductions.insert((assoc, arg), result);
    }

    #[must_use]
    pub fn reduce(&self, assoc: &Symbol, arg: &Type) -> Option<&Type> {
        self.reductions.get(&(assoc.clone(), arg.clone()))
    }
}

/// The whole-program IR root (SPEC_FULL.md §3, §6). On input every field is
/// populated by the upstream inferencer; on output only `defs` is
/// populated and `eq_env` is irrelevant (monomorphic defs need no further
/// associated-type reduction).
#[derive(Clone, Debug, Default)]
pub struct Root {
    pub defs: FxHashMap<Symbol, Def>,
    pub sigs: FxHashMap<Symbol, Sig>,
    pub traits: FxHashMap<Symbol, TraitDecl>,
    pub instances: FxHashMap<Symbol, Vec<Instance>>,
    pub aliases: FxHashMap<Symbol, TypeAliasDecl>,
    pub eq_env: EqEnv,
}

impl Root {
    #[must_use]
    pub fn new() -> Self {
        Root::default()
    }

    /// Non-parametric definitions: the seed set for the driver (SPEC_FULL.md
    /// §4.9 step 2).
    pub fn non_parametric_defs(&self) -> impl Iterator<Item = &Def> {
        self.defs.values().filter(|d| d.spec.is_monomorphic())
    }

    /// The output root: definitions only, every other table cleared
    /// (SPEC_FULL.md §6).
    #[must_use]
    pub fn from_defs(defs: FxHashMap<Symbol, Def>) -> Self {
        Root { defs, ..Root::default() }
    }
}
