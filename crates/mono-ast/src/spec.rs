use crate::expr::FormalParam;
use crate::types::{Type, TypeVar};
use mono_common::{SourceLoc, Symbol};
use std::sync::Arc;

/// `∀tvars. constraints ⇒ base`. `base` is the type unified against a
/// concrete demand type in `specializeDef` and in trait-instance matching
/// (SPEC_FULL.md §4.3, §4.5).
#[derive(Clone, Debug)]
pub struct Scheme {
    pub tvars: Vec<TypeVar>,
    pub constraints: Vec<TraitConstraint>,
    pub base: Type,
}

#[derive(Clone, Debug)]
pub struct TraitConstraint {
    pub trait_sym: Symbol,
    pub arg: Type,
}

#[derive(Clone, Debug)]
pub struct EqConstraint {
    pub assoc: Symbol,
    pub arg: Type,
    pub result: Type,
}

bitflags::bitflags! {
    /// Declaration modifiers carried through to specialized output
    /// unchanged (SPEC_FULL.md §6). Stored as flags, mirroring how the
    /// teacher represents AST node/symbol flag sets.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const PUBLIC  = 0b0000_0001;
        const INLINE  = 0b0000_0010;
        const LAWFUL  = 0b0000_0100;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Modifiers::empty()
    }
}

/// Everything about a definition or signature other than its body
/// (SPEC_FULL.md §3): documentation, annotations, modifiers, type/formal
/// parameters, the declared scheme used for unification, the declared
/// return/effect types, and the constraint lists preserved (vacuously,
/// post-specialization) for downstream diagnostics.
#[derive(Clone, Debug)]
pub struct Spec {
    pub doc: Option<Arc<str>>,
    pub annotations: Vec<Arc<str>>,
    pub modifiers: Modifiers,
    pub tparams: Vec<TypeVar>,
    pub fparams: Vec<FormalParam>,
    pub scheme: Scheme,
    pub return_type: Type,
    pub effect: Type,
    pub trait_constraints: Vec<TraitConstraint>,
    pub eq_constraints: Vec<EqConstraint>,
    pub loc: SourceLoc,
}

impl Spec {
    #[must_use]
    pub fn is_monomorphic(&self) -> bool {
        self.tparams.is_empty()
    }
}
