use crate::pattern::Pattern;
use crate::spec::Spec;
use crate::types::Type;
use mono_common::{LocalSymbol, SourceLoc, Symbol};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Unit,
    Bool(bool),
    Char(char),
    Int64(i64),
    Float64(f64),
    Str(Arc<str>),
}

/// A formal parameter, shared by `Spec::fparams` and `Expr::Lambda`.
#[derive(Clone, Debug)]
pub struct FormalParam {
    pub sym: LocalSymbol,
    pub tpe: Type,
    pub loc: SourceLoc,
}

/// A built-in/intrinsic operation applied to a fixed argument list
/// (`ApplyAtomic`). Modeled as a name rather than a closed enum because the
/// set of intrinsics belongs to the upstream language definition, not to
/// this pass — the specializer only needs to substitute types and recurse
/// into operands (SPEC_FULL.md §4.6).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtomicOp(pub Arc<str>);

#[derive(Clone, Debug)]
pub struct MatchRule {
    pub pat: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

/// One arm of a `TypeMatch`: binds `sym: tpe` in `body` if the scrutinee's
/// runtime type unifies with `tpe` (SPEC_FULL.md §4.6).
#[derive(Clone, Debug)]
pub struct TypeMatchRule {
    pub sym: LocalSymbol,
    pub tpe: Type,
    pub body: Expr,
}

#[derive(Clone, Debug)]
pub struct CatchRule {
    pub sym: LocalSymbol,
    pub exception_tpe: Type,
    pub body: Expr,
}

#[derive(Clone, Debug)]
pub struct HandlerRule {
    pub op_sym: Symbol,
    pub fparams: Vec<FormalParam>,
    pub continuation: FormalParam,
    pub body: Expr,
}

#[derive(Clone, Debug)]
pub struct ObjectMethod {
    pub sym: Symbol,
    pub spec: Spec,
    pub body: Expr,
}

/// The pass's expression language (SPEC_FULL.md §3). Every variant carries
/// the type(s)/effect that the specializer must run through the current
/// substitution; `loc` is preserved verbatim on output (§6).
#[derive(Clone, Debug)]
pub enum Expr {
    Var { sym: LocalSymbol, tpe: Type, loc: SourceLoc },
    Def { sym: Symbol, tpe: Type, loc: SourceLoc },
    Sig { sym: Symbol, tpe: Type, loc: SourceLoc },
    Constant { value: Constant, tpe: Type, loc: SourceLoc },
    Lambda { fparam: FormalParam, body: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    Apply { func: Box<Expr>, arg: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    ApplyAtomic { op: AtomicOp, args: Vec<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    Let { sym: LocalSymbol, bound: Box<Expr>, body: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    LetRec { sym: LocalSymbol, bound: Box<Expr>, body: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    Scope { sym: LocalSymbol, region: crate::types::TypeVar, body: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    IfThenElse { cond: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    Stm { first: Box<Expr>, rest: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    Discard { expr: Box<Expr>, eff: Type, loc: SourceLoc },
    Match { scrutinee: Box<Expr>, rules: Vec<MatchRule>, tpe: Type, eff: Type, loc: SourceLoc },
    TypeMatch { scrutinee: Box<Expr>, rules: Vec<TypeMatchRule>, tpe: Type, eff: Type, loc: SourceLoc },
    VectorLit { elems: Vec<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    VectorLoad { base: Box<Expr>, index: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    VectorLength { base: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    Ascribe { expr: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    Cast { expr: Box<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    TryCatch { expr: Box<Expr>, rules: Vec<CatchRule>, tpe: Type, eff: Type, loc: SourceLoc },
    TryWith { effect_sym: Symbol, expr: Box<Expr>, rules: Vec<HandlerRule>, tpe: Type, eff: Type, loc: SourceLoc },
    Do { op_sym: Symbol, effect_sym: Symbol, args: Vec<Expr>, tpe: Type, eff: Type, loc: SourceLoc },
    NewObject { methods: Vec<ObjectMethod>, tpe: Type, eff: Type, loc: SourceLoc },
}

impl Expr {
    #[must_use]
    pub fn loc(&self) -> SourceLoc {
        match self {
            Expr::Var { loc, .. }
            | Expr::Def { loc, .. }
            | Expr::Sig { loc, .. }
            | Expr::Constant { loc, .. }
            | Expr::Lambda { loc, .. }
            | Expr::Apply { loc, .. }
            | Expr::ApplyAtomic { loc, .. }
            | Expr::Let { loc, .. }
            | Expr::LetRec { loc, .. }
            | Expr::Scope { loc, .. }
            | Expr::IfThenElse { loc, .. }
            | Expr::Stm { loc, .. }
            | Expr::Discard { loc, .. }
            | Expr::Match { loc, .. }
            | Expr::TypeMatch { loc, .. }
            | Expr::VectorLit { loc, .. }
            | Expr::VectorLoad { loc, .. }
            | Expr::VectorLength { loc, .. }
            | Expr::Ascribe { loc, .. }
            | Expr::Cast { loc, .. }
            | Expr::TryCatch { loc, .. }
            | Expr::TryWith { loc, .. }
            | Expr::Do { loc, .. }
            | Expr::NewObject { loc, .. } => *loc,
        }
    }

    /// The expression's result type. `Discard` carries no `tpe` field of its
    /// own since discarding a value always yields unit.
    #[must_use]
    pub fn tpe(&self) -> Type {
        match self {
            Expr::Var { tpe, .. }
            | Expr::Def { tpe, .. }
            | Expr::Sig { tpe, .. }
            | Expr::Constant { tpe, .. }
            | Expr::Lambda { tpe, .. }
            | Expr::Apply { tpe, .. }
            | Expr::ApplyAtomic { tpe, .. }
            | Expr::Let { tpe, .. }
            | Expr::LetRec { tpe, .. }
            | Expr::Scope { tpe, .. }
            | Expr::IfThenElse { tpe, .. }
            | Expr::Stm { tpe, .. }
            | Expr::Match { tpe, .. }
            | Expr::TypeMatch { tpe, .. }
            | Expr::VectorLit { tpe, .. }
            | Expr::VectorLoad { tpe, .. }
            | Expr::VectorLength { tpe, .. }
            | Expr::Ascribe { tpe, .. }
            | Expr::Cast { tpe, .. }
            | Expr::TryCatch { tpe, .. }
            | Expr::TryWith { tpe, .. }
            | Expr::Do { tpe, .. }
            | Expr::NewObject { tpe, .. } => tpe.clone(),
            Expr::Discard { .. } => crate::types::well_known::unit(),
        }
    }

    /// The expression's effect. Pure references (`Var`/`Def`/`Sig`/
    /// `Constant`) have no `eff` field because they are always pure by
    /// construction; everything else carries one.
    #[must_use]
    pub fn eff(&self) -> Type {
        match self {
            Expr::Var { .. } | Expr::Def { .. } | Expr::Sig { .. } | Expr::Constant { .. } => crate::types::well_known::pure_effect(),
            Expr::Lambda { eff, .. }
            | Expr::Apply { eff, .. }
            | Expr::ApplyAtomic { eff, .. }
            | Expr::Let { eff, .. }
            | Expr::LetRec { eff, .. }
            | Expr::Scope { eff, .. }
            | Expr::IfThenElse { eff, .. }
            | Expr::Stm { eff, .. }
            | Expr::Discard { eff, .. }
            | Expr::Match { eff, .. }
            | Expr::TypeMatch { eff, .. }
            | Expr::VectorLit { eff, .. }
            | Expr::VectorLoad { eff, .. }
            | Expr::VectorLength { eff, .. }
            | Expr::Ascribe { eff, .. }
            | Expr::Cast { eff, .. }
            | Expr::TryCatch { eff, .. }
            | Expr::TryWith { eff, .. }
            | Expr::Do { eff, .. }
            | Expr::NewObject { eff, .. } => eff.clone(),
        }
    }

    /// Does this expression, anywhere in its (non-recursed) shape, mention a
    /// `Sig` node? Used only by tests asserting the "no Sig references
    /// remain" output invariant (SPEC_FULL.md §8) — the real rewrite never
    /// needs to query this, it always produces `Def`.
    #[must_use]
    pub fn is_sig_ref(&self) -> bool {
        matches!(self, Expr::Sig { .. })
    }
}
